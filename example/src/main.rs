use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;
use zeile::transform::{self, TransformError};
use zeile::{Codec, Envelope, Schema};

#[derive(Serialize, Deserialize, PartialEq, Debug)]
pub enum Species {
    PrionailurusViverrinus,
    LynxLynx,
    FelisCatus,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
pub struct Cat {
    name: String,
    species: Species,
    adopted: DateTime<Utc>,
    chip: Option<u64>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct Message {
    version: u32,
    cats: Vec<Cat>,
}

fn schema() -> anyhow::Result<Schema> {
    let cat = Schema::builder("Cat")
        .field("name", Codec::String)
        .field("species", Codec::String)
        .field("adopted", Codec::DateTime32)
        .field("chip", Codec::nullable(Codec::UInt64))
        .build()?;
    Ok(Schema::builder("Message")
        .field("version", Codec::UInt8)
        .field("cats", Codec::list(Codec::record(cat)))
        .build()?)
}

fn scramble(bytes: &[u8]) -> Result<Vec<u8>, TransformError> {
    Ok(bytes.iter().map(|b| b ^ 0x2a).collect())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let adopted = Utc.with_ymd_and_hms(2021, 3, 14, 15, 9, 26).single().unwrap_or_default();
    let msg = Message {
        version: 1,
        cats: vec![
            Cat { name: "Jessica".to_owned(), species: Species::PrionailurusViverrinus, adopted, chip: Some(900_164_000_123_456) },
            Cat { name: "Wantan".to_owned(), species: Species::LynxLynx, adopted, chip: None },
            Cat { name: "Sphinx".to_owned(), species: Species::FelisCatus, adopted, chip: None },
            Cat { name: "Chandra".to_owned(), species: Species::PrionailurusViverrinus, adopted, chip: Some(1) },
        ],
    };

    let schema = schema()?;
    let packed = zeile_serde::to_bytes(&schema, &msg)?;
    let json = serde_json::to_vec(&msg)?;
    info!(zeile = packed.len(), json = json.len(), "payload sizes");
    println!("{:02x?}", packed);

    let scrambler = transform::from_fn(|bytes: Vec<u8>| scramble(&bytes), scramble);
    let envelope = Envelope::new(&schema).transform(&scrambler);
    let scrambled = zeile_serde::to_bytes_with(&envelope, &msg)?;
    let decoded: Message = zeile_serde::from_bytes_with(&envelope, &scrambled)?;
    anyhow::ensure!(decoded == msg, "round trip through the transform changed the message");
    info!(bytes = scrambled.len(), "round trip through transform succeeded");
    Ok(())
}
