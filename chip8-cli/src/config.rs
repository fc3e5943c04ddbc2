//! Runner configuration, read from YAML.
use std::{fs, path::Path};

use chip8::{prelude::*, KeyCode};
use serde::Deserialize;

use crate::{clock::Hz, error::AppError};

/// Settings for a run of the interpreter.
///
/// ```yaml
/// clock_frequency: 60
/// max_steps: 10000
/// render: true
/// held_keys: [5]
/// vm:
///   key_wait: block
///   sprite_edge: wrap
///   rng_seed: 1234
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CliConf {
    /// Steps per second.
    pub clock_frequency: Hz,
    /// Stop after this many steps.
    pub max_steps: Option<usize>,
    /// Print the display to the terminal whenever it changes.
    pub render: bool,
    /// Stop when the program jumps to itself and can't make progress.
    pub stop_on_idle: bool,
    /// Keys held down for the whole run.
    pub held_keys: Vec<KeyCode>,
    pub vm: Chip8Conf,
}

impl Default for CliConf {
    fn default() -> Self {
        Self {
            clock_frequency: Hz::default(),
            max_steps: None,
            render: true,
            stop_on_idle: true,
            held_keys: vec![],
            vm: Chip8Conf::default(),
        }
    }
}

impl CliConf {
    pub fn from_yaml(source: &str) -> Result<Self, AppError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_file(filepath: impl AsRef<Path>) -> Result<Self, AppError> {
        let source = fs::read_to_string(filepath)?;
        Self::from_yaml(&source)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_full_config() {
        let conf = CliConf::from_yaml(
            r#"
clock_frequency: 500
max_steps: 10000
render: false
held_keys: [5, 15]
vm:
  key_wait: scan
  sprite_edge: wrap
  rng_seed: 1234
  halt_on_fault: true
"#,
        )
        .unwrap();

        assert_eq!(conf.clock_frequency, Hz(500));
        assert_eq!(conf.max_steps, Some(10000));
        assert!(!conf.render);
        assert!(conf.stop_on_idle);
        assert_eq!(conf.held_keys, [KeyCode::Key5, KeyCode::KeyF]);
        assert_eq!(conf.vm.key_wait, KeyWaitMode::Scan);
        assert_eq!(conf.vm.sprite_edge, SpriteEdge::Wrap);
        assert_eq!(conf.vm.rng_seed, Some(1234));
        assert!(conf.vm.halt_on_fault);
    }

    #[test]
    fn test_defaults() {
        let conf = CliConf::from_yaml("{}").unwrap();
        assert_eq!(conf.clock_frequency, Hz(60));
        assert_eq!(conf.max_steps, None);
        assert!(conf.render);
        assert_eq!(conf.vm.key_wait, KeyWaitMode::Block);
        assert_eq!(conf.vm.sprite_edge, SpriteEdge::Clip);
        assert_eq!(conf.vm.rng_seed, None);
    }

    #[test]
    fn test_invalid_key() {
        assert!(CliConf::from_yaml("held_keys: [16]").is_err());
    }
}
