use std::collections::HashMap;

use anyhow::Context;

use crate::data_structures::texture::Texture;

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().context("no browser window")?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("page origin is not readable"))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

/// Reads an asset: `./assets/<file_name>` natively, `<origin>/assets/<file_name>` on the web.
pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        reqwest::get(url).await?.error_for_status()?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new("./").join("assets").join(file_name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?
    };

    Ok(data)
}

pub async fn load_texture(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Texture> {
    let data = load_binary(file_name).await?;
    Texture::from_bytes(device, queue, &data, file_name)
}

/// Loads every source concurrently. Failures are logged and left out of the map.
pub async fn load_textures(
    sources: &[String],
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> HashMap<String, Texture> {
    let loads = sources
        .iter()
        .map(|source| async move { (source, load_texture(source, device, queue).await) });
    futures::future::join_all(loads)
        .await
        .into_iter()
        .filter_map(|(source, result)| match result {
            Ok(texture) => Some((source.clone(), texture)),
            Err(e) => {
                log::warn!("Texture {} could not be loaded, using white: {:#}", source, e);
                None
            }
        })
        .collect()
}
