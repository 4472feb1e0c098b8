use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Colour ramp applied by the provider when rendering a single-band index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colormap {
    /// Provider-hosted colormap id
    Predefined(&'static str),
    /// Named matplotlib-style ramp
    Named(&'static str),
}

impl Colormap {
    pub fn value(self) -> &'static str {
        match self {
            Colormap::Predefined(id) | Colormap::Named(id) => id,
        }
    }
}

/// Upstream render parameters for one logical layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderParams {
    pub bands: &'static str,
    pub colormap: Option<Colormap>,
    pub min_max: Option<&'static str>,
}

impl RenderParams {
    pub fn query(&self) -> Vec<(&'static str, &'static str)> {
        let mut query = Vec::new();
        if let Some(colormap) = self.colormap {
            query.push(("COLORMAP", colormap.value()));
        }
        if let Some(min_max) = self.min_max {
            query.push(("MIN_MAX", min_max));
        }
        query
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VegetationLayer {
    Ndvi,
    Ndmi,
    Evi,
    TrueColor,
}

impl VegetationLayer {
    /// Unknown or missing layer names render as true colour.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|r| r.trim().to_ascii_lowercase()).as_deref() {
            Some("ndvi") => VegetationLayer::Ndvi,
            Some("ndmi") => VegetationLayer::Ndmi,
            Some("evi") => VegetationLayer::Evi,
            _ => VegetationLayer::TrueColor,
        }
    }

    pub fn render_params(self) -> RenderParams {
        match self {
            VegetationLayer::Ndvi => RenderParams {
                bands: "NDVI",
                colormap: Some(Colormap::Predefined("a9bc6eceeef2a13bb88a7f641dca3aa0")),
                min_max: Some("-1,1"),
            },
            VegetationLayer::Ndmi => RenderParams {
                bands: "NDMI",
                colormap: Some(Colormap::Predefined("a53f2c53d3cbc1d424c35ac8dc883644")),
                min_max: Some("-1,1"),
            },
            VegetationLayer::Evi => RenderParams {
                bands: "EVI",
                colormap: Some(Colormap::Named("rdylgn")),
                min_max: Some("-1,1"),
            },
            VegetationLayer::TrueColor => RenderParams {
                bands: "B04,B03,B02",
                colormap: None,
                min_max: None,
            },
        }
    }
}

/// Diff maps: red for decline, yellow for no change, green for growth.
pub const DIFF_COLORMAP: &str = "RdYlGn";

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LegendStop {
    pub value: f64,
    pub color: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Legend {
    pub min: f64,
    pub max: f64,
    pub colors: Vec<LegendStop>,
}

pub fn diff_legend() -> Legend {
    Legend {
        min: -1.0,
        max: 1.0,
        colors: vec![
            LegendStop {
                value: -1.0,
                color: "#ef4444",
                label: "Decline",
            },
            LegendStop {
                value: 0.0,
                color: "#eab308",
                label: "No Change",
            },
            LegendStop {
                value: 1.0,
                color: "#22c55e",
                label: "Growth",
            },
        ],
    }
}
