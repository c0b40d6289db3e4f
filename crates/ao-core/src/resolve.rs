//! Fuzzy identifier resolution against the legal names of a snapshot.
//!
//! An exact match always wins. Otherwise every legal name containing the
//! token is a candidate; one candidate resolves, several are an error.

use std::collections::BTreeSet;

use crate::error::{AoError, AoResult, IdentKind};
use crate::snapshot::{ConfigPath, Snapshot, trim_json_suffix};

/// Environment, application and file names known to one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegalIdentifiers {
    pub envs: BTreeSet<String>,
    pub apps: BTreeSet<String>,
    pub files: BTreeSet<String>,
}

impl LegalIdentifiers {
    pub fn from_paths<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        let mut legal = Self::default();
        for path in paths {
            legal.files.insert(path.to_string());
            match ConfigPath::classify(path) {
                ConfigPath::EnvAbout { env } => {
                    legal.envs.insert(env.to_string());
                }
                ConfigPath::Deployment { env, app } => {
                    legal.envs.insert(env.to_string());
                    legal.apps.insert(app.to_string());
                }
                ConfigPath::AppRoot { app } => {
                    legal.apps.insert(app.to_string());
                }
                ConfigPath::Other => match path.split_once('/') {
                    Some((env, rest)) if !env.is_empty() && !rest.contains('/') => {
                        legal.envs.insert(env.to_string());
                    }
                    _ => {}
                },
            }
        }
        legal
    }

    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self::from_paths(snapshot.paths())
    }
}

/// Environments and applications named by a list of user tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedTargets {
    pub envs: Vec<String>,
    pub apps: Vec<String>,
}

impl ResolvedTargets {
    pub fn is_empty(&self) -> bool {
        self.envs.is_empty() && self.apps.is_empty()
    }

    fn push_env(&mut self, env: String) {
        if !self.envs.contains(&env) {
            self.envs.push(env);
        }
    }

    fn push_app(&mut self, app: String) {
        if !self.apps.contains(&app) {
            self.apps.push(app);
        }
    }
}

#[derive(Debug, Clone)]
pub struct Resolver {
    legal: LegalIdentifiers,
}

impl Resolver {
    pub fn new(snapshot: &Snapshot) -> Self {
        Self {
            legal: LegalIdentifiers::from_snapshot(snapshot),
        }
    }

    pub fn from_legal(legal: LegalIdentifiers) -> Self {
        Self { legal }
    }

    pub fn legal(&self) -> &LegalIdentifiers {
        &self.legal
    }

    pub fn resolve_env(&self, token: &str) -> AoResult<Option<String>> {
        fuzzy_match(
            IdentKind::Environment,
            token,
            self.legal.envs.iter().map(|e| (e.as_str(), e.as_str())),
            token,
        )
    }

    pub fn resolve_app(&self, token: &str) -> AoResult<Option<String>> {
        let needle = trim_json_suffix(token);
        fuzzy_match(
            IdentKind::Application,
            token,
            self.legal.apps.iter().map(|a| (a.as_str(), a.as_str())),
            needle,
        )
    }

    /// Resolve `[file]`, `[env/file]` or `[env, file]` to one path.
    pub fn resolve_file<S: AsRef<str>>(&self, tokens: &[S]) -> AoResult<Option<String>> {
        match tokens {
            [single] => {
                let single = single.as_ref();
                if let Some((env, file)) = single.split_once('/') {
                    return self.resolve_file(&[env, file]);
                }
                let candidates = self
                    .legal
                    .files
                    .iter()
                    .filter(|p| !p.contains('/'))
                    .map(|p| (p.as_str(), p.as_str()));
                fuzzy_file_match(single, candidates)
            }
            [env_token, file_token] => {
                let env_token = env_token.as_ref();
                let env = self
                    .resolve_env(env_token)?
                    .ok_or_else(|| AoError::NoMatch {
                        kind: IdentKind::Environment,
                        token: env_token.to_string(),
                    })?;
                let prefix = format!("{env}/");
                let candidates = self
                    .legal
                    .files
                    .iter()
                    .filter_map(|p| p.strip_prefix(&prefix).map(|rest| (rest, p.as_str())));
                fuzzy_file_match(file_token.as_ref(), candidates)
            }
            _ => Err(AoError::Usage(
                "expected <file>, <env>/<file> or <env> <file>".into(),
            )),
        }
    }

    /// Partition tokens into environments and applications.
    pub fn resolve_mixed_list<S: AsRef<str>>(&self, tokens: &[S]) -> AoResult<ResolvedTargets> {
        let mut targets = ResolvedTargets::default();
        for token in tokens {
            let token = token.as_ref();
            if let Some((env_token, app_token)) = token.split_once('/') {
                let env = self.require_env(env_token)?;
                let app = self.require_app(app_token)?;
                targets.push_env(env);
                targets.push_app(app);
                continue;
            }

            let env = self.resolve_env(token)?;
            let app = self.resolve_app(token)?;
            match (env, app) {
                (Some(env), Some(app)) => {
                    return Err(AoError::AmbiguousIdentifier {
                        kind: IdentKind::Identifier,
                        token: token.to_string(),
                        candidates: vec![
                            format!("environment {env}"),
                            format!("application {app}"),
                        ],
                    });
                }
                (Some(env), None) => targets.push_env(env),
                (None, Some(app)) => targets.push_app(app),
                (None, None) => {
                    return Err(AoError::NoMatch {
                        kind: IdentKind::Identifier,
                        token: token.to_string(),
                    });
                }
            }
        }
        Ok(targets)
    }

    pub fn require_env(&self, token: &str) -> AoResult<String> {
        self.resolve_env(token)?.ok_or_else(|| AoError::NoMatch {
            kind: IdentKind::Environment,
            token: token.to_string(),
        })
    }

    pub fn require_app(&self, token: &str) -> AoResult<String> {
        self.resolve_app(token)?.ok_or_else(|| AoError::NoMatch {
            kind: IdentKind::Application,
            token: token.to_string(),
        })
    }

    pub fn require_file<S: AsRef<str>>(&self, tokens: &[S]) -> AoResult<String> {
        self.resolve_file(tokens)?.ok_or_else(|| AoError::NoMatch {
            kind: IdentKind::File,
            token: tokens
                .iter()
                .map(|t| t.as_ref())
                .collect::<Vec<_>>()
                .join("/"),
        })
    }
}

/// Candidates are `(name matched against, identifier returned)` pairs.
fn fuzzy_match<'a>(
    kind: IdentKind,
    token: &str,
    candidates: impl Iterator<Item = (&'a str, &'a str)> + Clone,
    needle: &str,
) -> AoResult<Option<String>> {
    if let Some((_, id)) = candidates.clone().find(|(name, _)| *name == needle) {
        return Ok(Some(id.to_string()));
    }
    let found: Vec<&str> = candidates
        .filter(|(name, _)| name.contains(needle))
        .map(|(_, id)| id)
        .collect();
    match found.as_slice() {
        [] => Ok(None),
        [one] => Ok(Some(one.to_string())),
        _ => Err(AoError::AmbiguousIdentifier {
            kind,
            token: token.to_string(),
            candidates: found.iter().map(|s| s.to_string()).collect(),
        }),
    }
}

/// File names also match exactly when the token omits the `.json` suffix.
fn fuzzy_file_match<'a>(
    token: &str,
    candidates: impl Iterator<Item = (&'a str, &'a str)> + Clone,
) -> AoResult<Option<String>> {
    let with_suffix = format!("{}.json", trim_json_suffix(token));
    if let Some((_, id)) = candidates
        .clone()
        .find(|(name, _)| *name == token || *name == with_suffix)
    {
        return Ok(Some(id.to_string()));
    }
    fuzzy_match(IdentKind::File, token, candidates, token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::snapshot_of;

    fn resolver(paths: &[&str]) -> Resolver {
        Resolver::new(&snapshot_of(paths))
    }

    #[test]
    fn legal_sets_follow_path_convention() {
        let legal = LegalIdentifiers::from_paths([
            "about.json",
            "app1.json",
            "dev/about.json",
            "dev/app1.json",
            "test/app2.json",
        ]);
        assert_eq!(
            legal.envs.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["dev", "test"]
        );
        assert_eq!(
            legal.apps.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["about", "app1", "app2"]
        );
        assert_eq!(legal.files.len(), 5);
    }

    #[test]
    fn only_two_segment_paths_contribute_environments() {
        let legal = LegalIdentifiers::from_paths([
            "dev/secrets.properties",
            "templates/base/app.json",
            "/stray.json",
        ]);
        assert_eq!(
            legal.envs.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["dev"]
        );
        assert!(legal.apps.is_empty());
    }

    #[test]
    fn exact_match_beats_substring() {
        let r = resolver(&["api.json", "apigateway.json", "dev/api.json", "dev/apigateway.json"]);
        assert_eq!(r.resolve_app("api").unwrap().as_deref(), Some("api"));
        assert_eq!(r.resolve_app("gate").unwrap().as_deref(), Some("apigateway"));
    }

    #[test]
    fn foo_resolves_exactly_over_foobar() {
        let r = resolver(&["foo.json", "foobar.json"]);
        assert_eq!(r.resolve_app("foo").unwrap().as_deref(), Some("foo"));
    }

    #[test]
    fn ambiguous_substring_names_all_candidates() {
        let r = resolver(&["fooa.json", "foob.json"]);
        match r.resolve_app("foo") {
            Err(AoError::AmbiguousIdentifier {
                kind, candidates, ..
            }) => {
                assert_eq!(kind, IdentKind::Application);
                assert_eq!(candidates, vec!["fooa".to_string(), "foob".to_string()]);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn app_token_may_carry_json_suffix() {
        let r = resolver(&["dev/app1.json", "dev/app10.json"]);
        assert_eq!(r.resolve_app("app1.json").unwrap().as_deref(), Some("app1"));
    }

    #[test]
    fn env_without_match_is_empty() {
        let r = resolver(&["dev/app1.json"]);
        assert_eq!(r.resolve_env("prod").unwrap(), None);
        assert_eq!(r.resolve_env("de").unwrap().as_deref(), Some("dev"));
    }

    #[test]
    fn resolve_file_single_token_matches_root_files_only() {
        let r = resolver(&["app1.json", "dev/app1.json", "dev/about.json"]);
        assert_eq!(r.resolve_file(&["app1"]).unwrap().as_deref(), Some("app1.json"));
        assert_eq!(r.resolve_file(&["abo"]).unwrap(), None);
    }

    #[test]
    fn resolve_file_with_env_resolves_env_first() {
        let r = resolver(&["development/about.json", "development/app1.json", "test/app1.json"]);
        assert_eq!(
            r.resolve_file(&["dev", "app1"]).unwrap().as_deref(),
            Some("development/app1.json")
        );
        assert_eq!(
            r.resolve_file(&["dev/abo"]).unwrap().as_deref(),
            Some("development/about.json")
        );
        assert!(matches!(
            r.resolve_file(&["prod", "app1"]),
            Err(AoError::NoMatch {
                kind: IdentKind::Environment,
                ..
            })
        ));
    }

    #[test]
    fn resolve_file_rejects_ambiguous_and_bad_arity() {
        let r = resolver(&["dev/app1.json", "dev/app2.json"]);
        assert!(matches!(
            r.resolve_file(&["dev", "app"]),
            Err(AoError::AmbiguousIdentifier { .. })
        ));
        assert!(matches!(
            r.resolve_file(&["a", "b", "c"]),
            Err(AoError::Usage(_))
        ));
        let none: [&str; 0] = [];
        assert!(matches!(r.resolve_file(&none), Err(AoError::Usage(_))));
    }

    #[test]
    fn mixed_list_partitions_and_dedups() {
        let r = resolver(&[
            "dev/about.json",
            "dev/web.json",
            "test/api.json",
            "web.json",
            "api.json",
        ]);
        let targets = r
            .resolve_mixed_list(&["dev", "web", "test/api", "dev", "we"])
            .expect("resolve");
        assert_eq!(targets.envs, vec!["dev".to_string(), "test".to_string()]);
        assert_eq!(targets.apps, vec!["web".to_string(), "api".to_string()]);
    }

    #[test]
    fn mixed_list_rejects_env_app_collision_and_unknowns() {
        let r = resolver(&["web/about.json", "test/web.json"]);
        match r.resolve_mixed_list(&["web"]) {
            Err(AoError::AmbiguousIdentifier { kind, candidates, .. }) => {
                assert_eq!(kind, IdentKind::Identifier);
                assert_eq!(candidates.len(), 2);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
        let err = r.resolve_mixed_list(&["nothing"]).expect_err("no match");
        assert_eq!(err.to_string(), "no match found for nothing");
    }
}
