use anyhow::*;
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;
use std::env;
use std::path::PathBuf;

/// Texture maps the earth demo expects under `assets/`.
const EARTH_MAPS: [&str; 3] = [
    "img/4k_earth_daymap.jpg",
    "img/4k_earth_nightmap.jpg",
    "img/4k_earth_clouds.jpg",
];

fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets_src = manifest_dir.join("assets");
    if !assets_src.exists() {
        println!("cargo:warning=no assets/ directory, the earth demo will render untextured");
        return Ok(());
    }

    for map in EARTH_MAPS {
        if !assets_src.join(map).exists() {
            println!("cargo:warning=missing assets/{map}, it will be drawn white");
        }
    }

    let out_dir = env::var("OUT_DIR")?;
    let mut copy_options = CopyOptions::new();
    copy_options.overwrite = true;
    copy_items(&[assets_src], out_dir, &copy_options)?;

    Ok(())
}
