//! CircleCI config renderer
//!
//! Projects metadata into the embedded CircleCI template.

use crate::error::CliResult;
use crate::generator::Renderer;
use circlegen_resolver::{Metadata, ServiceSpec};
use serde::Serialize;
use std::collections::HashSet;
use tera::{Context, Tera};

const TEMPLATE_NAME: &str = "config.yml";

/// Branch that deploys and breaking-change checks run against unless told otherwise.
pub const DEFAULT_DEPLOY_BRANCH: &str = "master";

/// CircleCI config renderer backed by the embedded template
pub struct CircleCiRenderer {
    tera: Tera,
    deploy_branch: String,
}

/// A service as the template sees it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServiceView<'a> {
    #[serde(flatten)]
    spec: &'a ServiceSpec,
    name_underscored: String,
}

impl<'a> From<&'a ServiceSpec> for ServiceView<'a> {
    fn from(spec: &'a ServiceSpec) -> Self {
        Self {
            spec,
            name_underscored: spec.name_underscored(),
        }
    }
}

impl CircleCiRenderer {
    pub fn new() -> CliResult<Self> {
        Self::from_template(include_str!("templates/config.yml.tera"))
    }

    /// Build a renderer from template source instead of the embedded one.
    pub fn from_template(source: &str) -> CliResult<Self> {
        let mut tera = Tera::default();
        // Output is YAML, never HTML.
        tera.autoescape_on(vec![]);
        tera.add_raw_template(TEMPLATE_NAME, source)?;
        Ok(Self {
            tera,
            deploy_branch: DEFAULT_DEPLOY_BRANCH.to_string(),
        })
    }

    /// Deploy only from `branch`, and check proto changes against it.
    pub fn with_deploy_branch(mut self, branch: &str) -> Self {
        self.deploy_branch = branch.to_string();
        self
    }

    /// Template context: every metadata field under its YAML name, the
    /// derived values, and `nameUnderscored` on each service.
    ///
    /// `uniqueChangedServices` keeps the first entry per name so job
    /// definitions stay unique when `changedServices` has duplicates.
    fn context(&self, metadata: &Metadata) -> CliResult<Context> {
        let mut context = Context::from_serialize(metadata)?;

        let services: Vec<ServiceView> = metadata.services.iter().map(ServiceView::from).collect();
        let changed: Vec<ServiceView> = metadata
            .changed_services()
            .iter()
            .map(ServiceView::from)
            .collect();
        let mut seen = HashSet::new();
        let unique_changed: Vec<ServiceView> = metadata
            .changed_services()
            .iter()
            .filter(|s| seen.insert(s.name.as_str()))
            .map(ServiceView::from)
            .collect();

        context.insert("services", &services);
        context.insert("changedServices", &changed);
        context.insert("uniqueChangedServices", &unique_changed);
        context.insert("hasGrpc", &metadata.has_grpc());
        context.insert("needsApproval", &metadata.needs_approval());
        context.insert("argOverrides", &metadata.arg_overrides());

        let image_repository = if metadata.deploy.product.is_empty() {
            &metadata.name
        } else {
            &metadata.deploy.product
        };
        context.insert("imageRepository", image_repository);
        context.insert("deployBranch", &self.deploy_branch);
        Ok(context)
    }
}

impl Renderer for CircleCiRenderer {
    fn render(&self, metadata: &Metadata) -> CliResult<String> {
        let context = self.context(metadata)?;
        Ok(self.tera.render(TEMPLATE_NAME, &context)?)
    }
}
