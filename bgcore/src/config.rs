//! Parser configuration, loadable from TOML.
//!
//! ```toml
//! [encoding]
//! sign = "signed"
//! charset = "utf-8"
//! byte-order = "little-endian"
//! ```
//!
//! Every key is optional and falls back to the library default
//! (unsigned, ASCII, big-endian).
use std::{path::Path, sync::Arc};

use bgdata::{encoding::Encoding, source::ByteSource};
use serde::{Deserialize, Serialize};

use crate::{
    error::{BgError, BgResult},
    token::{ParseResult, Token},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Encoding inherited by tokens that do not override it.
    pub encoding: Encoding,
}

impl Config {
    pub fn from_toml_str(toml_str: &str) -> BgResult<Self> {
        toml::from_str(toml_str).map_err(|source| BgError::ConfigParse {
            file: "<inline>".to_string(),
            source,
        })
    }

    /// Load a [`Config`] from a TOML file.
    pub fn load_from_toml(path: &Path) -> BgResult<Self> {
        let toml_str = std::fs::read_to_string(path).map_err(|source| BgError::ConfigIo {
            file: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&toml_str).map_err(|source| BgError::ConfigParse {
            file: path.display().to_string(),
            source,
        })
    }

    /// Save the [`Config`] to a TOML file.
    pub fn save_to_toml(&self, path: &Path) -> BgResult<()> {
        let toml_str = toml::to_string(self)?;
        std::fs::write(path, toml_str).map_err(|source| BgError::ConfigWrite {
            file: path.to_path_buf(),
            source,
        })
    }

    #[inline]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Parse `source` with `token`, starting at offset 0.
    pub fn parse(&self, token: &Arc<Token>, source: Arc<dyn ByteSource>) -> BgResult<ParseResult> {
        crate::parse(token, source, self.encoding)
    }
}

#[cfg(test)]
mod tests {
    use bgdata::encoding::{ByteOrder, Charset, Sign};

    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.encoding(), Encoding::default());
    }

    #[test]
    fn partial_encoding() {
        let config = Config::from_toml_str(
            r#"
            [encoding]
            byte-order = "little-endian"
            "#,
        )
        .unwrap();
        assert_eq!(config.encoding.byte_order, ByteOrder::LittleEndian);
        assert_eq!(config.encoding.sign, Sign::Unsigned);
        assert_eq!(config.encoding.charset, Charset::Ascii);
    }

    #[test]
    fn full_encoding() {
        let config = Config::from_toml_str(
            r#"
            [encoding]
            sign = "signed"
            charset = "utf-8"
            byte-order = "big-endian"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.encoding,
            Encoding::new(Sign::Signed, Charset::Utf8, ByteOrder::BigEndian)
        );
    }

    #[test]
    fn rejects_unknown_values() {
        let err = Config::from_toml_str("[encoding]\nsign = \"maybe\"\n").unwrap_err();
        assert!(matches!(err, BgError::ConfigParse { .. }));
    }

    #[test]
    fn file_roundtrip() {
        let path = std::env::temp_dir().join(format!("bgcore-config-{}.toml", std::process::id()));
        let config = Config {
            encoding: Encoding::default().with_sign(Sign::Signed),
        };
        config.save_to_toml(&path).unwrap();
        let loaded = Config::load_from_toml(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, config);

        assert!(matches!(
            Config::load_from_toml(&path),
            Err(BgError::ConfigIo { .. })
        ));
    }
}
