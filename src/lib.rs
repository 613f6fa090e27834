// Library exports for datachat

pub mod compiler;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod graph;
pub mod infer;
pub mod ingest;
pub mod invoker;
pub mod ir;
pub mod model;
pub mod normalize;
pub mod palette;
pub mod parser;
pub mod prompt;
pub mod session;

use anyhow::Result;
use serde::Deserialize;

pub use model::{ChartSpec, ChartType};
pub use normalize::{normalize_payload, AiReply};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 300 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            format: OutputFormat::Png,
        }
    }
}

/// Render a chart spec: infer keys, compile the plan, draw it.
pub fn render_chart(spec: &ChartSpec, options: &RenderOptions) -> Result<Vec<u8>> {
    let plan = compiler::compile_chart(spec);
    graph::render_plan(&plan, spec, options)
}
