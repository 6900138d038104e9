// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Tracing runtime control.

use ordermap::OrderMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::{Mutex, OnceLock};
use thiserror::Error;
#[allow(unused)]
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, Registry, filter::LevelFilter, prelude::*, reload};

use crate::targets::TRACING_TARGETS;
use crate::trace_target;

trace_target!("tracectl", LevelFilter::INFO, &[]);

#[derive(Debug, Error, PartialEq)]
pub enum TraceCtlError {
    #[error("No tracing target or tag named '{0}'")]
    UnknownTarget(String),
    #[error("Invalid log level '{0}'")]
    BadLevel(String),
    #[error("Invalid syntax '{0}': expected name=level")]
    Syntax(String),
    #[error("Tracing database is not accessible")]
    Poisoned,
}

#[derive(Debug, Clone)]
pub struct TargetCfg {
    pub target: &'static str,
    pub name: &'static str,
    pub level: LevelFilter,
    pub tags: Vec<&'static str>,
}

#[derive(Debug)]
struct TargetCfgDb {
    level: LevelFilter,
    targets: OrderMap<&'static str, TargetCfg>,
}

impl TargetCfgDb {
    fn new(level: LevelFilter) -> Self {
        let mut targets = OrderMap::new();
        for t in TRACING_TARGETS {
            let mut tags = t.tags.to_vec();
            if !tags.contains(&t.name) {
                tags.push(t.name);
            }
            let cfg = TargetCfg {
                target: t.target,
                name: t.name,
                level: t.level,
                tags,
            };
            if let Some(prior) = targets.insert(t.name, cfg) {
                warn!("Tracing target name '{}' is declared twice", prior.name);
            }
        }
        Self { level, targets }
    }
    fn env_filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::new(self.level.to_string());
        for t in self.targets.values() {
            if let Ok(directive) = format!("{}={}", t.target, t.level).parse() {
                filter = filter.add_directive(directive);
            }
        }
        filter
    }
    /// Set the level of the target with the given name, or of all targets with the given tag.
    /// Returns the number of targets changed.
    fn set_level(&mut self, name: &str, level: LevelFilter) -> Result<usize, TraceCtlError> {
        let mut matched = false;
        let mut changed = 0;
        for t in self.targets.values_mut() {
            if t.name == name || t.tags.contains(&name) {
                matched = true;
                if t.level != level {
                    t.level = level;
                    changed += 1;
                }
            }
        }
        if matched {
            Ok(changed)
        } else {
            Err(TraceCtlError::UnknownTarget(name.to_owned()))
        }
    }
    fn as_config_string(&self) -> String {
        let mut out = format!("default={}", self.level);
        for t in self.targets.values() {
            out += format!(",{}={}", t.name, t.level).as_str();
        }
        out
    }
}

impl Display for TargetCfgDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:>24} │ {:>8} │ {}", "NAME", "LEVEL", "TARGET")?;
        for t in self.targets.values() {
            writeln!(f, "{:>24} │ {:>8} │ {}", t.name, t.level, t.target)?;
        }
        write!(f, "{:>24} │ {:>8} │ --", "(default)", self.level)
    }
}

/// Runtime control of the log levels of the registered tracing targets
#[derive(Debug)]
pub struct TracingControl {
    db: Mutex<TargetCfgDb>,
    reload_filter: reload::Handle<EnvFilter, Registry>,
}

static TRACING_CTL: OnceLock<TracingControl> = OnceLock::new();

/// Get a reference to the static [`TracingControl`], initializing it if needed
pub fn get_trace_ctl() -> &'static TracingControl {
    TRACING_CTL.get_or_init(|| TracingControl::new(LevelFilter::INFO))
}

impl TracingControl {
    fn new(level: LevelFilter) -> Self {
        let db = TargetCfgDb::new(level);
        let (filter, reload_filter) = reload::Layer::new(db.env_filter());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_line_number(true)
            .with_target(true)
            .with_thread_names(true)
            .with_level(true);

        // a subscriber may already exist, e.g. in tests
        if let Err(e) = tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
        {
            debug!("Tracing subscriber not installed: {e}");
        }
        Self {
            db: Mutex::new(db),
            reload_filter,
        }
    }
    /// Initialize the tracing subscriber with the registered targets
    pub fn init() {
        get_trace_ctl();
    }
    fn reload(&self, db: &TargetCfgDb) {
        if let Err(e) = self.reload_filter.reload(db.env_filter()) {
            debug!("Could not reload tracing filter: {e}");
        }
    }

    /// Set the level of a target (by name) or of all targets sharing a tag.
    ///
    /// # Errors
    ///
    /// Fails if no target has that name or tag.
    pub fn set_level(&self, name: &str, level: LevelFilter) -> Result<(), TraceCtlError> {
        let mut db = self.db.lock().map_err(|_| TraceCtlError::Poisoned)?;
        let changed = db.set_level(name, level)?;
        if changed > 0 {
            self.reload(&db);
        }
        info!("Log level for '{name}' set to {level} ({changed} targets changed)");
        Ok(())
    }

    /// Set the level for events not covered by any registered target
    ///
    /// # Errors
    ///
    /// Fails if the internal database is poisoned.
    pub fn set_default_level(&self, level: LevelFilter) -> Result<(), TraceCtlError> {
        let mut db = self.db.lock().map_err(|_| TraceCtlError::Poisoned)?;
        if db.level != level {
            db.level = level;
            self.reload(&db);
        }
        Ok(())
    }

    /// Get the level of the target with the given name
    #[must_use]
    pub fn get_level(&self, name: &str) -> Option<LevelFilter> {
        let db = self.db.lock().ok()?;
        db.targets.get(name).map(|t| t.level)
    }

    /// Get the configuration of all registered targets
    #[must_use]
    pub fn targets(&self) -> Vec<TargetCfg> {
        self.db
            .lock()
            .map(|db| db.targets.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Apply a comma-separated list of name=level items. `default` sets the default level.
    ///
    /// # Errors
    ///
    /// Fails on syntax errors, unknown levels or unknown targets. Nothing is applied on failure.
    pub fn setup_from_string(&self, input: &str) -> Result<(), TraceCtlError> {
        let mut config = Vec::new();
        for item in input.split(',').map(str::trim) {
            let Some((name, level)) = item.split_once('=') else {
                return Err(TraceCtlError::Syntax(item.to_owned()));
            };
            let level = LevelFilter::from_str(level.trim())
                .map_err(|_| TraceCtlError::BadLevel(level.trim().to_owned()))?;
            config.push((name.trim().to_owned(), level));
        }
        let mut db = self.db.lock().map_err(|_| TraceCtlError::Poisoned)?;
        if let Some((name, _)) = config.iter().find(|(name, _)| {
            name != "default"
                && !db
                    .targets
                    .values()
                    .any(|t| t.name == name.as_str() || t.tags.contains(&name.as_str()))
        }) {
            return Err(TraceCtlError::UnknownTarget(name.clone()));
        }
        for (name, level) in config {
            if name == "default" {
                db.level = level;
            } else {
                db.set_level(&name, level)?;
            }
        }
        self.reload(&db);
        Ok(())
    }

    #[must_use]
    pub fn as_config_string(&self) -> String {
        self.db
            .lock()
            .map(|db| db.as_config_string())
            .unwrap_or_default()
    }

    pub fn dump(&self) {
        if let Ok(db) = self.db.lock() {
            info!("\n{db}");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::control::{TraceCtlError, get_trace_ctl};
    use crate::targets::TRACING_TARGETS;
    use crate::{LevelFilter, trace_target};
    use serial_test::serial;

    mod first {
        crate::trace_target!("test-first", LevelFilter::DEBUG, &["test-common"]);
    }
    mod second {
        crate::trace_target!("test-second", LevelFilter::WARN, &["test-common"]);
    }

    #[test]
    fn targets_are_collected_at_link_time() {
        // declared after use on purpose
        let names: Vec<&str> = TRACING_TARGETS.iter().map(|t| t.name()).collect();
        assert!(names.contains(&"tracectl"));
        assert!(names.contains(&"test-first"));
        assert!(names.contains(&"test-second"));
        assert!(names.contains(&"test-late"));
        trace_target!("test-late", LevelFilter::ERROR, &[]);
    }

    #[test]
    #[serial]
    fn set_level_by_name_and_tag() {
        let tctl = get_trace_ctl();
        tctl.set_level("test-first", LevelFilter::TRACE).unwrap();
        assert_eq!(tctl.get_level("test-first"), Some(LevelFilter::TRACE));
        assert_eq!(tctl.get_level("test-second"), Some(LevelFilter::WARN));

        tctl.set_level("test-common", LevelFilter::OFF).unwrap();
        assert_eq!(tctl.get_level("test-first"), Some(LevelFilter::OFF));
        assert_eq!(tctl.get_level("test-second"), Some(LevelFilter::OFF));

        assert_eq!(
            tctl.set_level("no-such-target", LevelFilter::INFO),
            Err(TraceCtlError::UnknownTarget("no-such-target".to_owned()))
        );
    }

    #[test]
    #[serial]
    fn setup_from_string() {
        let tctl = get_trace_ctl();
        tctl.setup_from_string("default=warn, test-first=error,test-second=debug")
            .unwrap();
        assert_eq!(tctl.get_level("test-first"), Some(LevelFilter::ERROR));
        assert_eq!(tctl.get_level("test-second"), Some(LevelFilter::DEBUG));
        assert!(tctl.as_config_string().starts_with("default=warn"));

        // failures leave the configuration untouched
        assert!(matches!(
            tctl.setup_from_string("test-first=bad"),
            Err(TraceCtlError::BadLevel(_))
        ));
        assert!(matches!(
            tctl.setup_from_string("test-first=info, foo"),
            Err(TraceCtlError::Syntax(_))
        ));
        assert!(matches!(
            tctl.setup_from_string("test-first=info,nope=info"),
            Err(TraceCtlError::UnknownTarget(_))
        ));
        assert_eq!(tctl.get_level("test-first"), Some(LevelFilter::ERROR));
        tctl.dump();
    }
}
