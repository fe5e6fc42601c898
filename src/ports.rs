//! Bounded port pool: lowest-free acquisition, idempotent release.

use std::collections::BTreeSet;
use std::env;

use tracing::warn;

use crate::errors::LifecycleError;

pub const DEFAULT_MIN_PORT: u16 = 3000;
pub const DEFAULT_MAX_PORT: u16 = 4000;

/// In-memory index of assigned ports over a fixed inclusive range.
///
/// The persisted branch→port map is the source of truth; an allocator is
/// constructed fresh for each command invocation and seeded from it, so a
/// restart can never re-issue a port that is already recorded as in use.
#[derive(Debug, Clone)]
pub struct PortAllocator {
    min: u16,
    max: u16,
    in_use: BTreeSet<u16>,
}

impl PortAllocator {
    pub fn with_range(min: u16, max: u16) -> Self {
        Self {
            min,
            max,
            in_use: BTreeSet::new(),
        }
    }

    /// Allocator whose in-use set is rebuilt from persisted assignments.
    /// Ports outside the range are ignored; they can never be handed out
    /// again, so tracking them would only skew the free count.
    pub fn seeded<I>(min: u16, max: u16, assigned: I) -> Self
    where
        I: IntoIterator<Item = u16>,
    {
        let in_use = assigned
            .into_iter()
            .filter(|p| (min..=max).contains(p))
            .collect();
        Self { min, max, in_use }
    }

    /// Lowest-numbered free port in the range; marks it in use.
    /// Deterministic so repeated runs are reproducible.
    pub fn acquire(&mut self) -> Result<u16, LifecycleError> {
        for port in self.min..=self.max {
            if !self.in_use.contains(&port) {
                self.in_use.insert(port);
                return Ok(port);
            }
        }
        Err(LifecycleError::PoolExhausted {
            min: self.min,
            max: self.max,
        })
    }

    /// Mark `port` free again. Releasing an already-free or out-of-range
    /// port is a no-op; remove operations may be retried after a partial
    /// failure and must not error here.
    pub fn release(&mut self, port: u16) {
        self.in_use.remove(&port);
    }

    pub fn free_count(&self) -> usize {
        (self.max as usize + 1 - self.min as usize) - self.in_use.len()
    }
}

impl Default for PortAllocator {
    fn default() -> Self {
        Self::with_range(DEFAULT_MIN_PORT, DEFAULT_MAX_PORT)
    }
}

/// Pool range from `BRANCHBOX_PORT_MIN` / `BRANCHBOX_PORT_MAX`, falling back
/// on the defaults when unset or unusable.
pub fn range_from_env() -> (u16, u16) {
    parse_range(
        env::var("BRANCHBOX_PORT_MIN").ok(),
        env::var("BRANCHBOX_PORT_MAX").ok(),
    )
}

fn parse_range(min: Option<String>, max: Option<String>) -> (u16, u16) {
    let parse = |raw: Option<String>, name: &str, default: u16| -> u16 {
        match raw {
            None => default,
            Some(v) => match v.trim().parse::<u16>() {
                Ok(n) => n,
                Err(_) => {
                    warn!("ignoring {name}={v:?}: not a valid port");
                    default
                }
            },
        }
    };
    let min = parse(min, "BRANCHBOX_PORT_MIN", DEFAULT_MIN_PORT);
    let max = parse(max, "BRANCHBOX_PORT_MAX", DEFAULT_MAX_PORT);
    if min > max {
        warn!("ignoring port range {min}-{max}: min exceeds max");
        return (DEFAULT_MIN_PORT, DEFAULT_MAX_PORT);
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range_defaults() {
        assert_eq!(parse_range(None, None), (DEFAULT_MIN_PORT, DEFAULT_MAX_PORT));
    }

    #[test]
    fn test_parse_range_overrides() {
        assert_eq!(
            parse_range(Some("4100".into()), Some("4200".into())),
            (4100, 4200)
        );
    }

    #[test]
    fn test_parse_range_rejects_garbage() {
        assert_eq!(
            parse_range(Some("not-a-port".into()), None),
            (DEFAULT_MIN_PORT, DEFAULT_MAX_PORT)
        );
    }

    #[test]
    fn test_parse_range_rejects_inverted() {
        assert_eq!(
            parse_range(Some("4000".into()), Some("3000".into())),
            (DEFAULT_MIN_PORT, DEFAULT_MAX_PORT)
        );
    }
}
