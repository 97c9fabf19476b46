//! Star schema DDL
//!
//! Dimension tables must exist before fact_crash so the foreign keys can be
//! declared.

pub const DIM_DATE: &str = "
CREATE TABLE dim_date (
    date_id INTEGER PRIMARY KEY,
    year INTEGER,
    month INTEGER,
    month_name TEXT,
    day_of_week TEXT,
    is_weekend INTEGER,
    is_holiday INTEGER,
    time_of_day TEXT
);";

pub const DIM_LOCATION: &str = "
CREATE TABLE dim_location (
    location_id INTEGER PRIMARY KEY,
    state TEXT,
    remoteness_area TEXT,
    sa4_name TEXT,
    lga_name TEXT
);";

pub const DIM_ROAD: &str = "
CREATE TABLE dim_road (
    road_id INTEGER PRIMARY KEY,
    road_type TEXT,
    speed_limit INTEGER
);";

pub const DIM_PERSON: &str = "
CREATE TABLE dim_person (
    person_id INTEGER PRIMARY KEY,
    road_user_type TEXT,
    gender TEXT,
    age INTEGER,
    age_group TEXT
);";

pub const DIM_VEHICLE: &str = "
CREATE TABLE dim_vehicle (
    vehicle_id INTEGER PRIMARY KEY,
    bus_involvement TEXT,
    heavy_rigid_truck_involvement TEXT,
    articulated_truck_involvement TEXT
);";

pub const FACT_CRASH: &str = "
CREATE TABLE fact_crash (
    crash_id INTEGER PRIMARY KEY,
    original_id TEXT,
    date_id INTEGER NOT NULL,
    location_id INTEGER NOT NULL,
    road_id INTEGER NOT NULL,
    person_id INTEGER NOT NULL,
    vehicle_id INTEGER NOT NULL,
    crash_type TEXT,
    number_fatalities INTEGER,
    christmas_period INTEGER,
    easter_period INTEGER,
    FOREIGN KEY (date_id) REFERENCES dim_date(date_id),
    FOREIGN KEY (location_id) REFERENCES dim_location(location_id),
    FOREIGN KEY (road_id) REFERENCES dim_road(road_id),
    FOREIGN KEY (person_id) REFERENCES dim_person(person_id),
    FOREIGN KEY (vehicle_id) REFERENCES dim_vehicle(vehicle_id)
);";

/// All tables, in creation order
pub const ALL: [&str; 6] = [
    DIM_DATE,
    DIM_LOCATION,
    DIM_ROAD,
    DIM_PERSON,
    DIM_VEHICLE,
    FACT_CRASH,
];

pub const FACT_TABLE: &str = "fact_crash";
