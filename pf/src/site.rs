//! Site definitions for the simulator
//!
//! A site file describes the host document at startup, the pages and the
//! documents the in-memory loader serves:
//!
//! ```yaml
//! url: /
//! markup: '<body><div id="home"></div></body>'
//! pages:
//!   - key: "#home"
//!     routes: ["/"]
//!   - key: "#about"
//!     routes: ["/about"]
//!     can-leave: false
//! documents:
//!   /about:
//!     html: '<body><div id="about"></div></body>'
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::host::{Host, MemoryHost};
use crate::loader::{StaticDocument, StaticLoader};
use crate::page::{InitOptions, Page, PageRegistry, RouteError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Site {
    /// URL shown by the host at startup
    pub url: String,
    /// Host document markup at startup
    pub markup: String,
    pub pages: Vec<SitePageDef>,
    /// Route → served document
    pub documents: BTreeMap<String, SiteDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitePageDef {
    pub key: String,
    #[serde(default)]
    pub routes: Vec<String>,
    #[serde(rename = "can-enter", default = "default_true")]
    pub can_enter: bool,
    #[serde(rename = "can-leave", default = "default_true")]
    pub can_leave: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteDocument {
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub html: String,
}

fn default_true() -> bool {
    true
}

fn default_status() -> u16 {
    200
}

/// Collaborators built from a site
pub struct SiteParts {
    pub host: Arc<MemoryHost>,
    pub pages: PageRegistry,
    pub loader: StaticLoader,
}

impl Site {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).context(format!("Failed to read site file {}", path.display()))?;
        Self::parse(&content).context(format!("Failed to parse site file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let site: Self = serde_yaml::from_str(content)?;
        debug!(pages = site.pages.len(), documents = site.documents.len(), "Site::parse: parsed");
        Ok(site)
    }

    pub fn build(&self) -> Result<SiteParts, RouteError> {
        let host = Arc::new(MemoryHost::new(self.url.clone(), self.markup.clone()));

        let mut pages = PageRegistry::new();
        for def in &self.pages {
            pages.register(Arc::new(SitePage::new(def.clone(), Arc::clone(&host) as Arc<dyn Host>)))?;
        }

        let mut loader = StaticLoader::new();
        for (route, doc) in &self.documents {
            loader.insert(
                route.clone(),
                StaticDocument {
                    status: doc.status,
                    body: doc.html.clone(),
                },
            );
        }

        Ok(SiteParts { host, pages, loader })
    }
}

/// A page described by a site file; loaded once its node is in the host
pub struct SitePage {
    def: SitePageDef,
    host: Arc<dyn Host>,
}

impl SitePage {
    pub fn new(def: SitePageDef, host: Arc<dyn Host>) -> Self {
        Self { def, host }
    }
}

impl Page for SitePage {
    fn key(&self) -> &str {
        &self.def.key
    }

    fn routes(&self) -> &[String] {
        &self.def.routes
    }

    fn loaded(&self) -> bool {
        self.host.has_node(&self.def.key)
    }

    fn can_enter(&self) -> bool {
        self.def.can_enter
    }

    fn can_leave(&self) -> bool {
        self.def.can_leave
    }

    fn init(&self, opts: InitOptions) {
        debug!(page = %self.def.key, first_time = opts.first_time, "SitePage::init: called");
    }
}
