//! Serde adapter storing an optional weights row vector as a flat sequence,
//! e.g. `[0.5, 2.0, 1.0]`.

use ndarray::Array1;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub fn serialize<S, T>(weights: &Option<Array1<T>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    match weights {
        Some(w) => serializer.collect_seq(w.iter()),
        None => serializer.serialize_none(),
    }
}

pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Array1<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let values: Option<Vec<T>> = Option::deserialize(deserializer)?;
    Ok(values.map(Array1::from))
}
