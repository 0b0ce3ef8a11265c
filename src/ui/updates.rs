use anyhow::Result;
use geofacet_core::{FacetConfig, Publisher, Update};
use std::collections::BTreeMap;

use crate::ui::formatting::{render_json, render_markdown};
use crate::OutputFormat;

/// Publisher that keeps the rendering of the latest update
pub struct Renderer {
    format: OutputFormat,
    limit: Option<usize>,
    facets: BTreeMap<String, FacetConfig>,
    output: Option<serde_json::Result<String>>,
}

impl Renderer {
    pub fn new(
        format: OutputFormat,
        limit: Option<usize>,
        facets: BTreeMap<String, FacetConfig>,
    ) -> Self {
        Self {
            format,
            limit,
            facets,
            output: None,
        }
    }

    /// The last rendered update, or an empty string if nothing was published
    pub fn into_output(self) -> Result<String> {
        Ok(self.output.transpose()?.unwrap_or_default())
    }
}

impl Publisher for Renderer {
    fn publish(&mut self, update: &Update<'_>) {
        self.output = Some(match self.format {
            OutputFormat::Markdown => Ok(render_markdown(update, &self.facets, self.limit)),
            OutputFormat::Json => render_json(update, self.limit),
        });
    }
}
