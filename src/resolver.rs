//! Natural key → surrogate key lookup
//!
//! Built from a finished [`DimensionTable`], so every tuple the dimension
//! builder saw resolves. A miss means the fact stage is looking at records the
//! dimension stage never scanned.

use crate::dimension::{DimensionSet, DimensionTable, SurrogateKey};
use crate::record::Value;
use crate::schema::Family;
use fnv::FnvHashMap;

/// Hash index over one dimension table
#[derive(Debug, Clone)]
pub struct KeyResolver {
    family: Family,
    index: FnvHashMap<Vec<Value>, SurrogateKey>,
}

impl KeyResolver {
    pub fn from_table(table: &DimensionTable) -> Self {
        let index = table
            .rows()
            .iter()
            .map(|row| (row.natural_key.clone(), row.key))
            .collect();
        Self {
            family: table.family(),
            index,
        }
    }

    /// Surrogate key for a natural-key tuple, or `None` if the tuple is unknown
    pub fn resolve(&self, natural_key: &[Value]) -> Option<SurrogateKey> {
        self.index.get(natural_key).copied()
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// One resolver per family
#[derive(Debug, Clone)]
pub struct ResolverSet {
    resolvers: Vec<KeyResolver>,
}

impl ResolverSet {
    pub fn from_dimensions(dimensions: &DimensionSet) -> Self {
        Self {
            resolvers: dimensions.iter().map(KeyResolver::from_table).collect(),
        }
    }

    pub fn get(&self, family: Family) -> &KeyResolver {
        &self.resolvers[family.index()]
    }
}
