#![no_main]

use crashwh::dimension::DimensionSet;
use crashwh::schema::SourceSchema;
use crashwh::source::RecordSet;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Malformed CSV must come back as an error, never a panic
    if let Ok(set) = RecordSet::from_reader(data) {
        let _ = DimensionSet::build(&set.records, &SourceSchema::default());
    }
});
