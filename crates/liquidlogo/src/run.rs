use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use logofield::{FieldCache, FieldKey, SourceImage};
use renderer::{PreviewConfig, PreviewRuntime};
use tracing_subscriber::EnvFilter;

use crate::cli::{resolve_params, Cli, ParamOverrides};

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn run(cli: Cli) -> Result<()> {
    let file_overrides = match cli.params.as_ref() {
        Some(path) => load_overrides(path)?,
        None => ParamOverrides::default(),
    };
    let params = resolve_params(cli.preset, file_overrides, cli.flag_overrides());
    tracing::debug!(?params, image = %cli.image.display(), "resolved effect parameters");

    let source = SourceImage::from_path(&cli.image)?;
    let key = FieldKey::for_path(&cli.image)?;
    let mut cache = FieldCache::default();
    let field = cache.get_or_extract(&key, &source)?;

    if let Some(path) = cli.export_field.as_ref() {
        let png = field.encode_png()?;
        fs::write(path, png)
            .with_context(|| format!("failed to write field raster to {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            width = field.width(),
            height = field.height(),
            "exported field raster"
        );
        return Ok(());
    }

    let config = PreviewConfig {
        title: cli.title.clone(),
        logical_side: cli.side,
        params,
    };
    tracing::info!(title = %config.title, side = config.logical_side, "opening preview window");
    let runtime = PreviewRuntime::spawn(config, field)?;
    runtime.wait()
}

fn load_overrides(path: &Path) -> Result<ParamOverrides> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read params file {}", path.display()))?;
    toml::from_str(&text)
        .with_context(|| format!("failed to parse params file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Preset;

    #[test]
    fn overrides_file_layers_over_the_preset() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("params.toml");
        std::fs::write(&path, "speed = 0.6\nliquid = 0.2\n").expect("write");

        let overrides = load_overrides(&path).expect("load");
        let params = resolve_params(Preset::Default, overrides, ParamOverrides::default());
        assert_eq!(params.speed, 0.6);
        assert_eq!(params.liquid, 0.2);
        assert_eq!(params.edge, 1.0);
    }

    #[test]
    fn unknown_params_keys_fail_with_the_file_named() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("params.toml");
        std::fs::write(&path, "sheen = 2.0\n").expect("write");

        let err = load_overrides(&path).unwrap_err();
        assert!(err.to_string().contains("params.toml"));
    }

    #[test]
    fn missing_params_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_overrides(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }
}
