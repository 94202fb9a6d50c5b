use std::{env, fs, path::Path};

use anyhow::{Context, Result, bail};

fn get(key: &str, default: usize) -> Result<(String, String)> {
  println!("cargo:rerun-if-env-changed={}", key);
  match env::var(key) {
    Ok(val) => {
      let n = val
        .parse::<usize>()
        .with_context(|| format!("{} must be a number, get: {}", key, val))?;
      if n == 0 {
        bail!("{} must be > 0", key);
      }
      Ok((key.to_string(), val))
    }
    Err(_) => Ok((key.to_string(), default.to_string())),
  }
}

fn save(filename: &str, configs: &[(String, String)]) -> Result<()> {
  let out_dir = env::var_os("OUT_DIR").context("OUT_DIR not found")?;
  let dest_path = Path::new(&out_dir).join(filename);

  let content = configs
    .iter()
    .map(|(k, v)| format!("pub const {}: usize = {};", k.trim_start_matches("UNDO_"), v))
    .collect::<Vec<_>>()
    .join("\n");

  if let Ok(current) = fs::read_to_string(&dest_path)
    && current == content
  {
    return Ok(());
  }

  fs::write(&dest_path, content).with_context(|| format!("Failed to write {}", filename))?;
  Ok(())
}

fn main() -> Result<()> {
  let blcksz = get("UNDO_BLCKSZ", 8192)?;
  let seg_pages = get("UNDO_SEG_PAGES", 512)?;

  // Page header (24B) must leave room for record data
  // 页头（24 字节）之外必须还有数据空间
  if blcksz.1.parse::<usize>()? <= 64 {
    bail!("UNDO_BLCKSZ too small: {}", blcksz.1);
  }

  save("layout.rs", &[blcksz, seg_pages])?;
  Ok(())
}
