//! Serializable solver parameters, as recorded in sidecars and sweep results.

use anyhow::{bail, Result};
use blockpaint::color::ColorMethod;
use blockpaint::tactics::{GrowthAnchor, RectCropCfg};
use blockpaint::SolverParams;
use serde::{Deserialize, Serialize};

/// Flat parameter record; missing fields fall back to the library defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamsDoc {
    pub cut_limit: u64,
    pub cut_tolerance: u8,
    pub snap: bool,
    pub bucket_size: u8,
    pub merge_limit: u64,
    pub color_method: String,
    pub only_if_improves: bool,
    pub crop_min_size: u64,
    pub crop_tolerance: u8,
    pub crop_seed_anchor: bool,
    pub seed: u64,
    pub similarity_factor: f64,
}

impl Default for ParamsDoc {
    fn default() -> Self {
        let p = SolverParams::default();
        Self {
            cut_limit: p.cut_limit,
            cut_tolerance: p.cut_tolerance,
            snap: p.snap,
            bucket_size: p.bucket_size,
            merge_limit: p.merge_limit,
            color_method: method_name(p.color_method).to_string(),
            only_if_improves: p.only_if_improves,
            crop_min_size: p.rect_crop.min_size,
            crop_tolerance: p.rect_crop.tolerance,
            crop_seed_anchor: p.rect_crop.anchor == GrowthAnchor::Seed,
            seed: p.seed,
            similarity_factor: p.scoring.similarity_factor,
        }
    }
}

pub fn parse_method(s: &str) -> Result<ColorMethod> {
    Ok(match s {
        "average" | "avg" => ColorMethod::Average,
        "median" => ColorMethod::Median,
        "mode" => ColorMethod::Mode,
        other => bail!("unknown color method {other:?} (average, median, mode)"),
    })
}

pub fn method_name(m: ColorMethod) -> &'static str {
    match m {
        ColorMethod::Average => "average",
        ColorMethod::Median => "median",
        ColorMethod::Mode => "mode",
    }
}

impl ParamsDoc {
    pub fn to_solver(&self) -> Result<SolverParams> {
        if !(self.similarity_factor.is_finite() && self.similarity_factor >= 0.0) {
            bail!("similarity_factor must be finite and >= 0");
        }
        let defaults = SolverParams::default();
        Ok(SolverParams {
            cut_limit: self.cut_limit,
            cut_tolerance: self.cut_tolerance,
            snap: self.snap,
            bucket_size: self.bucket_size.max(1),
            merge_limit: self.merge_limit,
            color_method: parse_method(&self.color_method)?,
            only_if_improves: self.only_if_improves,
            rect_crop: RectCropCfg {
                min_size: self.crop_min_size,
                tolerance: self.crop_tolerance,
                anchor: if self.crop_seed_anchor {
                    GrowthAnchor::Seed
                } else {
                    GrowthAnchor::Average
                },
                seed: Some(self.seed),
                ..defaults.rect_crop
            },
            seed: self.seed,
            scoring: blockpaint::ScoringCfg {
                similarity_factor: self.similarity_factor,
            },
            ..defaults
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let doc: ParamsDoc =
            serde_json::from_str(r#"{"cut_limit": 99, "color_method": "mode"}"#).unwrap();
        let p = doc.to_solver().unwrap();
        assert_eq!(p.cut_limit, 99);
        assert_eq!(p.color_method, ColorMethod::Mode);
        assert_eq!(p.merge_limit, SolverParams::default().merge_limit);
    }

    #[test]
    fn rejects_unknown_method() {
        let doc = ParamsDoc {
            color_method: "mean-ish".into(),
            ..ParamsDoc::default()
        };
        assert!(doc.to_solver().is_err());
    }
}
