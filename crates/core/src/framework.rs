//! Framework detection from root-level manifest files
//!
//! Inspects `package.json`, `composer.json`, and `project.godot` to produce a
//! framework tag set, and decides cross-stack eligibility (frontend + Laravel
//! in one root, defeated by an external API base URL in `.env`). The tag set
//! tunes parser selection and entity tagging only.

use crate::parser::{DependencyKind, ParseResult, SymbolKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Frameworks recognized from manifests.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Framework {
    Vue,
    React,
    Next,
    Nuxt,
    Express,
    Fastify,
    Laravel,
    Symfony,
    Godot,
}

impl Framework {
    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::Vue => "vue",
            Framework::React => "react",
            Framework::Next => "next",
            Framework::Nuxt => "nuxt",
            Framework::Express => "express",
            Framework::Fastify => "fastify",
            Framework::Laravel => "laravel",
            Framework::Symfony => "symfony",
            Framework::Godot => "godot",
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why cross-stack analysis is or is not eligible for this root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrossStackDecision {
    /// Frontend and Laravel share the root and no external API is configured
    Eligible,
    /// A `.env` declares a non-localhost API base URL
    ExternalApi(String),
    /// The stacks required for cross-stack analysis are not both present
    NotApplicable,
    /// Forced by configuration
    Overridden(bool),
}

impl CrossStackDecision {
    pub fn is_eligible(&self) -> bool {
        matches!(
            self,
            CrossStackDecision::Eligible | CrossStackDecision::Overridden(true)
        )
    }
}

/// Detector output: the tag set plus the cross-stack decision.
#[derive(Debug, Clone)]
pub struct FrameworkDetection {
    pub frameworks: BTreeSet<Framework>,
    pub cross_stack: CrossStackDecision,
}

impl FrameworkDetection {
    pub fn has(&self, framework: Framework) -> bool {
        self.frameworks.contains(&framework)
    }

    pub fn tags(&self) -> Vec<String> {
        self.frameworks.iter().map(|f| f.to_string()).collect()
    }
}

/// Kinds of auxiliary framework rows derived from parses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FrameworkEntityKind {
    Route,
    Controller,
    Model,
    Component,
    Job,
    Scene,
    Node,
    Script,
    Autoload,
}

impl FrameworkEntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameworkEntityKind::Route => "route",
            FrameworkEntityKind::Controller => "controller",
            FrameworkEntityKind::Model => "model",
            FrameworkEntityKind::Component => "component",
            FrameworkEntityKind::Job => "job",
            FrameworkEntityKind::Scene => "scene",
            FrameworkEntityKind::Node => "node",
            FrameworkEntityKind::Script => "script",
            FrameworkEntityKind::Autoload => "autoload",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "route" => Some(FrameworkEntityKind::Route),
            "controller" => Some(FrameworkEntityKind::Controller),
            "model" => Some(FrameworkEntityKind::Model),
            "component" => Some(FrameworkEntityKind::Component),
            "job" => Some(FrameworkEntityKind::Job),
            "scene" => Some(FrameworkEntityKind::Scene),
            "node" => Some(FrameworkEntityKind::Node),
            "script" => Some(FrameworkEntityKind::Script),
            "autoload" => Some(FrameworkEntityKind::Autoload),
            _ => None,
        }
    }
}

/// A framework entity before store ids are assigned. `symbol_name` links the
/// row back to a symbol in the same file when one exists.
#[derive(Debug, Clone)]
pub struct FrameworkEntityDraft {
    pub kind: FrameworkEntityKind,
    pub name: String,
    pub symbol_name: Option<String>,
    pub metadata: serde_json::Value,
}

/// Minimal package.json shape: only dependency key sets matter here.
#[derive(Debug, Deserialize)]
struct PackageJson {
    #[serde(default)]
    dependencies: BTreeMap<String, serde_json::Value>,
    #[serde(rename = "devDependencies", default)]
    dev_dependencies: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ComposerJson {
    #[serde(default)]
    require: BTreeMap<String, serde_json::Value>,
    #[serde(rename = "require-dev", default)]
    require_dev: BTreeMap<String, serde_json::Value>,
}

/// Detect frameworks from the manifests at `root`.
pub fn detect_frameworks(root: &Path, cross_stack_override: Option<bool>) -> FrameworkDetection {
    let mut frameworks = BTreeSet::new();

    if let Some(pkg) = read_package_json(root) {
        let keys: BTreeSet<&str> = pkg
            .dependencies
            .keys()
            .chain(pkg.dev_dependencies.keys())
            .map(|k| k.as_str())
            .collect();
        for (dep, framework) in [
            ("vue", Framework::Vue),
            ("react", Framework::React),
            ("next", Framework::Next),
            ("nuxt", Framework::Nuxt),
            ("express", Framework::Express),
            ("fastify", Framework::Fastify),
        ] {
            if keys.contains(dep) {
                frameworks.insert(framework);
            }
        }
        if keys.contains("nuxt3") {
            frameworks.insert(Framework::Nuxt);
        }
    }

    if let Some(composer) = read_composer_json(root) {
        let keys: BTreeSet<&str> = composer
            .require
            .keys()
            .chain(composer.require_dev.keys())
            .map(|k| k.as_str())
            .collect();
        if keys.iter().any(|k| k.starts_with("laravel/")) {
            frameworks.insert(Framework::Laravel);
        }
        if keys.iter().any(|k| k.starts_with("symfony/")) {
            frameworks.insert(Framework::Symfony);
        }
    }

    if root.join("project.godot").exists() {
        frameworks.insert(Framework::Godot);
    }

    let cross_stack = match cross_stack_override {
        Some(forced) => CrossStackDecision::Overridden(forced),
        None => decide_cross_stack(root, &frameworks),
    };

    debug!(?frameworks, ?cross_stack, "framework detection");
    FrameworkDetection {
        frameworks,
        cross_stack,
    }
}

fn read_package_json(root: &Path) -> Option<PackageJson> {
    let contents = std::fs::read_to_string(root.join("package.json")).ok()?;
    serde_json::from_str(&contents).ok()
}

fn read_composer_json(root: &Path) -> Option<ComposerJson> {
    let contents = std::fs::read_to_string(root.join("composer.json")).ok()?;
    serde_json::from_str(&contents).ok()
}

fn decide_cross_stack(root: &Path, frameworks: &BTreeSet<Framework>) -> CrossStackDecision {
    let has_frontend =
        frameworks.contains(&Framework::Vue) || frameworks.contains(&Framework::Nuxt);
    if !has_frontend || !frameworks.contains(&Framework::Laravel) {
        return CrossStackDecision::NotApplicable;
    }

    if let Some(url) = external_api_base(root) {
        return CrossStackDecision::ExternalApi(url);
    }

    CrossStackDecision::Eligible
}

/// Scan `.env` for an API base URL pointing somewhere other than localhost.
fn external_api_base(root: &Path) -> Option<String> {
    let contents = std::fs::read_to_string(root.join(".env")).ok()?;

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if !matches!(
            key,
            "API_BASE_URL" | "VITE_API_BASE_URL" | "VUE_APP_API_URL" | "NUXT_PUBLIC_API_BASE"
        ) {
            continue;
        }
        let value = value.trim().trim_matches('"').trim_matches('\'');
        if value.is_empty() {
            continue;
        }
        if !value.contains("localhost") && !value.contains("127.0.0.1") {
            return Some(value.to_string());
        }
    }

    None
}

/// Derive framework entity rows from one file's parse result.
///
/// The Godot parser emits its entities directly; this pass adds the tag-driven
/// ones: Laravel controllers/models/jobs and Vue components.
pub fn tag_entities(
    parse: &ParseResult,
    frameworks: &BTreeSet<Framework>,
) -> Vec<FrameworkEntityDraft> {
    let mut entities: Vec<FrameworkEntityDraft> = parse.framework_entities.clone();

    if frameworks.contains(&Framework::Laravel) {
        for symbol in &parse.symbols {
            if symbol.kind != SymbolKind::Class {
                continue;
            }
            if symbol.name.ends_with("Controller") {
                entities.push(FrameworkEntityDraft {
                    kind: FrameworkEntityKind::Controller,
                    name: symbol.name.clone(),
                    symbol_name: Some(symbol.name.clone()),
                    metadata: serde_json::json!({}),
                });
            }
            if inherits_from(parse, &symbol.name, "Model") {
                entities.push(FrameworkEntityDraft {
                    kind: FrameworkEntityKind::Model,
                    name: symbol.name.clone(),
                    symbol_name: Some(symbol.name.clone()),
                    metadata: serde_json::json!({}),
                });
            }
            if implements_interface(parse, &symbol.name, "ShouldQueue") {
                entities.push(FrameworkEntityDraft {
                    kind: FrameworkEntityKind::Job,
                    name: symbol.name.clone(),
                    symbol_name: Some(symbol.name.clone()),
                    metadata: serde_json::json!({}),
                });
            }
        }
    }

    if frameworks.contains(&Framework::Vue) || frameworks.contains(&Framework::Nuxt) {
        for symbol in &parse.symbols {
            if symbol.kind == SymbolKind::Component {
                entities.push(FrameworkEntityDraft {
                    kind: FrameworkEntityKind::Component,
                    name: symbol.name.clone(),
                    symbol_name: Some(symbol.name.clone()),
                    metadata: serde_json::json!({}),
                });
            }
        }
    }

    entities
}

fn inherits_from(parse: &ParseResult, class_name: &str, base: &str) -> bool {
    parse.dependencies.iter().any(|d| {
        d.kind == DependencyKind::Inherits
            && d.from_symbol_matches(class_name)
            && last_segment(&d.target) == base
    })
}

fn implements_interface(parse: &ParseResult, class_name: &str, interface: &str) -> bool {
    parse.dependencies.iter().any(|d| {
        d.kind == DependencyKind::Implements
            && d.from_symbol_matches(class_name)
            && last_segment(&d.target) == interface
    })
}

fn last_segment(target: &str) -> &str {
    target
        .rsplit(['\\', '.'])
        .next()
        .unwrap_or(target)
}
