use crate::hex;
use rand::{rngs::StdRng, SeedableRng};
use ranger::{generate::random_value, Marshaler, Object, Schema};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

pub const CHECK_CMD: &str = "check";
pub const SAMPLE_CMD: &str = "sample";
pub const DECODE_CMD: &str = "decode";

pub const DEFAULT_COUNT: &str = "1";

#[derive(Error, Debug)]
pub enum Error {
    #[error("schema error: {0}")]
    Schema(#[from] ranger::schema::Error),
    #[error("marshal error: {0}")]
    Marshal(#[from] ranger::Error),
    #[error("invalid hex input")]
    InvalidHex,
    #[error("size mismatch for {type_name}: size {size} but encoded {encoded} bytes")]
    SizeMismatch {
        type_name: String,
        size: usize,
        encoded: usize,
    },
    #[error("value of {0} did not survive a round trip")]
    RoundTrip(String),
}

/// Loads and validates a schema, then prints every type with its minimum encoded size.
pub fn check(schema_path: &Path) -> Result<(), Error> {
    let schema = Schema::from_file(schema_path)?;
    info!(
        path = ?schema_path,
        package = schema.package(),
        "schema is valid"
    );
    for def in schema.types() {
        println!(
            "{} (fields: {}, min size: {})",
            def.name(),
            def.fields().len(),
            def.min_size()
        );
    }
    Ok(())
}

/// Generates `count` random values of `type_name` and prints their encodings.
///
/// Every value is decoded again and compared against the original before it is printed.
pub fn sample(schema_path: &Path, type_name: &str, seed: u64, count: usize) -> Result<(), Error> {
    let schema = Schema::from_file(schema_path)?;
    let mut rng = StdRng::seed_from_u64(seed);
    for i in 0..count {
        let value = random_value(&schema, type_name, &mut rng)?;
        let obj = Object::with_value(&schema, value)?;
        let encoded = obj.marshal()?;
        if encoded.len() != obj.size() {
            return Err(Error::SizeMismatch {
                type_name: type_name.to_string(),
                size: obj.size(),
                encoded: encoded.len(),
            });
        }

        let mut decoded = schema.object(type_name)?;
        decoded.unmarshal(&encoded)?;
        if decoded.value() != obj.value() {
            return Err(Error::RoundTrip(type_name.to_string()));
        }
        debug!(index = i, value = ?obj.value(), "sampled value");
        println!("{}", hex::encode(&encoded));
    }
    info!(type_name, seed, count, "sampled values");
    Ok(())
}

/// Unmarshals a hex-encoded value of `type_name` and prints it.
pub fn decode(schema_path: &Path, type_name: &str, input: &str) -> Result<(), Error> {
    let schema = Schema::from_file(schema_path)?;
    let data = hex::decode(input).ok_or(Error::InvalidHex)?;
    let mut obj = schema.object(type_name)?;
    obj.unmarshal(&data)?;
    info!(type_name, len = data.len(), "decoded value");
    println!("{:#?}", obj.value());
    Ok(())
}
