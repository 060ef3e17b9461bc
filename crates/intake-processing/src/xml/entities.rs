//! Entity declarations and bounded expansion

use regex::Regex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Deadline and cancellation are polled every this many steps
const CHECK_INTERVAL: u64 = 256;

pub(crate) const ENTITY_DECLARATION_PATTERN: &str = r#"(?s)<!ENTITY\s+(%\s+)?([A-Za-z_:][A-Za-z0-9_.:\-]*)\s+(?:"([^"]*)"|'([^']*)'|(?:SYSTEM|PUBLIC)\s+(?:"([^"]*)"|'([^']*)')(?:\s+(?:"[^"]*"|'[^']*'))?(?:\s+NDATA\s+[^\s>]+)?)\s*>"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EntityDef {
    Internal(String),
    /// Never fetched; expands to nothing
    External { identifier: String },
}

/// Why a parse stopped early
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Abort {
    /// Deadline, cancellation, depth or size ceiling reached
    Exhausted(&'static str),
    Malformed(String),
}

/// Evaluation budget of one parse
#[derive(Debug)]
pub(crate) struct Budget {
    deadline: Instant,
    cancel: Arc<AtomicBool>,
    max_depth: usize,
    max_bytes: usize,
    steps: u64,
    produced: usize,
}

impl Budget {
    pub(crate) fn new(
        deadline: Instant,
        cancel: Arc<AtomicBool>,
        max_depth: usize,
        max_bytes: usize,
    ) -> Self {
        Self {
            deadline,
            cancel,
            max_depth,
            max_bytes,
            steps: 0,
            produced: 0,
        }
    }

    pub(crate) fn tick(&mut self) -> Result<(), Abort> {
        self.steps += 1;
        if self.steps % CHECK_INTERVAL == 0 {
            if self.cancel.load(Ordering::Relaxed) {
                return Err(Abort::Exhausted("cancelled"));
            }
            if Instant::now() >= self.deadline {
                return Err(Abort::Exhausted("deadline"));
            }
        }
        Ok(())
    }

    pub(crate) fn produce(&mut self, bytes: usize) -> Result<(), Abort> {
        self.produced = self.produced.saturating_add(bytes);
        if self.produced > self.max_bytes {
            return Err(Abort::Exhausted("expanded size"));
        }
        self.tick()
    }
}

/// General entity declarations from a DOCTYPE internal subset.
///
/// Parameter entities are ignored. The first declaration of a name wins.
pub(crate) fn scan_declarations(pattern: &Regex, doctype: &str) -> HashMap<String, EntityDef> {
    let mut entities = HashMap::new();

    for caps in pattern.captures_iter(doctype) {
        if caps.get(1).is_some() {
            continue;
        }
        let Some(name) = caps.get(2).map(|m| m.as_str().to_string()) else {
            continue;
        };

        let def = match (caps.get(3).or_else(|| caps.get(4)), caps.get(5).or_else(|| caps.get(6))) {
            (Some(value), _) => EntityDef::Internal(value.as_str().to_string()),
            (None, Some(identifier)) => EntityDef::External {
                identifier: identifier.as_str().to_string(),
            },
            (None, None) => continue,
        };

        entities.entry(name).or_insert(def);
    }

    entities
}

/// Expand character and entity references in `raw`, appending to `out`.
pub(crate) fn expand(
    raw: &str,
    entities: &HashMap<String, EntityDef>,
    budget: &mut Budget,
    depth: usize,
    out: &mut String,
) -> Result<(), Abort> {
    let mut rest = raw;

    while let Some(amp) = rest.find('&') {
        let (plain, tail) = rest.split_at(amp);
        out.push_str(plain);
        budget.produce(plain.len())?;

        let Some(semi) = tail.find(';') else {
            return Err(Abort::Malformed("EntityRef: expecting ';'".to_string()));
        };
        let name = &tail[1..semi];
        rest = &tail[semi + 1..];

        if let Some(c) = char_reference(name)? {
            out.push(c);
            budget.produce(c.len_utf8())?;
            continue;
        }

        if let Some(c) = predefined(name) {
            out.push(c);
            budget.produce(1)?;
            continue;
        }

        match entities.get(name) {
            Some(EntityDef::Internal(value)) => {
                if depth + 1 > budget.max_depth {
                    return Err(Abort::Exhausted("entity depth"));
                }
                expand(value, entities, budget, depth + 1, out)?;
            }
            Some(EntityDef::External { identifier }) => {
                tracing::debug!(entity = %name, identifier = %identifier, "External entity not resolved");
                budget.tick()?;
            }
            None => {
                return Err(Abort::Malformed(format!("Entity '{}' not defined", name)));
            }
        }
    }

    out.push_str(rest);
    budget.produce(rest.len())
}

fn predefined(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => None,
    }
}

fn char_reference(name: &str) -> Result<Option<char>, Abort> {
    let Some(number) = name.strip_prefix('#') else {
        return Ok(None);
    };

    let code = match number.strip_prefix('x') {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => number.parse::<u32>(),
    }
    .map_err(|_| Abort::Malformed(format!("Invalid character reference '&{};'", name)))?;

    char::from_u32(code)
        .filter(|c| *c != '\0')
        .map(Some)
        .ok_or_else(|| Abort::Malformed(format!("Invalid character value {}", code)))
}
