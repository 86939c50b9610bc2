// crates/server/src/routes/params.rs
//! Query parameters shared by the submission endpoints.

use inferbox_core::{RecognizeError, RecognizeOptions};
use serde::Deserialize;

/// `?lang=&angle_cls=&gpu=`; anything left out falls back to the server defaults.
#[derive(Debug, Default, Deserialize)]
pub struct OptionsQuery {
    pub lang: Option<String>,
    pub angle_cls: Option<bool>,
    pub gpu: Option<bool>,
}

impl OptionsQuery {
    /// Merge over `defaults` and validate the result.
    pub fn resolve(self, defaults: &RecognizeOptions) -> Result<RecognizeOptions, RecognizeError> {
        let options = RecognizeOptions {
            lang: self.lang.unwrap_or_else(|| defaults.lang.clone()),
            use_angle_cls: self.angle_cls.unwrap_or(defaults.use_angle_cls),
            use_gpu: self.gpu.unwrap_or(defaults.use_gpu),
        };
        options.validate()?;
        Ok(options)
    }
}
