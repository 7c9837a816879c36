use apq_config::ApqConfig;
use schemars::schema_for;

static SCHEMA_PATH: &str = "libs/config/apq.schema.json";

pub fn main() -> anyhow::Result<()> {
  println!("⚙️ Generating JSON schema for the config file...");
  let schema = schema_for!(ApqConfig);
  let as_string = serde_json::to_string_pretty(&schema)?;
  println!("✏️ Writing to: {}", SCHEMA_PATH);
  std::fs::write(SCHEMA_PATH, as_string)?;
  println!("✅ Done");

  Ok(())
}
