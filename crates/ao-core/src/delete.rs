//! Cascading delete planner.
//!
//! One planner serves one delete command. Each candidate path is offered to
//! the confirmation collaborator as soon as it is found, so cascade checks see
//! the user's earlier answers: a declined deployment keeps its environment's
//! `about.json`. Nothing is written until [`commit_plan`].

use std::str::FromStr;

use crate::client::SnapshotClient;
use crate::error::{AoError, AoResult};
use crate::snapshot::{ABOUT_FILE, ConfigPath, Snapshot, about_path, deployment_path, root_path};

/// Interactive yes/no/cancel collaborator.
pub trait Confirm {
    /// Returns `"Y"`, `"N"` or `"C"`; anything else is rejected by the planner.
    fn prompt_yes_no_cancel(&mut self, text: &str) -> AoResult<String>;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> AoResult<String>,
{
    fn prompt_yes_no_cancel(&mut self, text: &str) -> AoResult<String> {
        self(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    Cancel,
}

impl FromStr for Answer {
    type Err = AoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Y" => Ok(Answer::Yes),
            "N" => Ok(Answer::No),
            "C" => Ok(Answer::Cancel),
            other => Err(AoError::Prompt(format!(
                "unexpected answer '{other}', expected Y, N or C"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDeletion {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionPlan {
    entries: Vec<PlannedDeletion>,
}

impl DeletionPlan {
    pub fn entries(&self) -> &[PlannedDeletion] {
        &self.entries
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.path.as_str())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.iter().any(|e| e.path == path)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Snapshot with every planned path removed.
    pub fn apply(&self, snapshot: &Snapshot) -> Snapshot {
        snapshot.without(self.paths())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerState {
    Collecting,
    Confirmed,
    Cancelled,
}

pub struct DeletePlanner<'s, C> {
    snapshot: &'s Snapshot,
    confirm: C,
    force: bool,
    plan: DeletionPlan,
    state: PlannerState,
}

impl<'s, C: Confirm> DeletePlanner<'s, C> {
    pub fn new(snapshot: &'s Snapshot, confirm: C) -> Self {
        Self {
            snapshot,
            confirm,
            force: false,
            plan: DeletionPlan::default(),
            state: PlannerState::Collecting,
        }
    }

    /// Forced mode: no prompts, missing targets are silently skipped.
    pub fn forced(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn state(&self) -> PlannerState {
        self.state
    }

    pub fn plan(&self) -> &DeletionPlan {
        &self.plan
    }

    pub fn plan_delete_file(&mut self, path: &str) -> AoResult<()> {
        self.ensure_collecting()?;
        if !self.snapshot.contains(path) {
            return self.missing(format!("file {path}"));
        }
        self.offer(path, format!("Delete file {path}"))
    }

    pub fn plan_delete_app(&mut self, app: &str) -> AoResult<()> {
        self.ensure_collecting()?;
        let deployments: Vec<(String, String)> = self
            .snapshot
            .paths()
            .filter_map(|p| match ConfigPath::classify(p) {
                ConfigPath::Deployment { env, app: a } if a == app => {
                    Some((p.to_string(), env.to_string()))
                }
                _ => None,
            })
            .collect();

        for (path, env) in deployments {
            self.offer(&path, format!("Delete file {path}"))?;
            let about = about_path(&env);
            if !self.env_has_remaining_files(&env) && self.snapshot.contains(&about) {
                self.offer(
                    &about,
                    format!("No other deployments in {env}, delete about file {about}"),
                )?;
            }
        }

        let root = root_path(app);
        if self.snapshot.contains(&root) {
            self.offer(&root, format!("Delete file {root}"))?;
        }
        Ok(())
    }

    pub fn plan_delete_env(&mut self, env: &str) -> AoResult<()> {
        self.ensure_collecting()?;
        let prefix = format!("{env}/");
        let files: Vec<String> = self
            .snapshot
            .paths()
            .filter(|p| p.starts_with(&prefix))
            .map(str::to_string)
            .collect();

        for path in files {
            self.offer(&path, format!("Delete file {path}"))?;
            if let ConfigPath::Deployment { app, .. } = ConfigPath::classify(&path) {
                let root = root_path(app);
                if !self.app_has_remaining_deployments(app) && self.snapshot.contains(&root) {
                    self.offer(
                        &root,
                        format!("No other deployment of {app} exists, delete root file {root}"),
                    )?;
                }
            }
        }
        Ok(())
    }

    pub fn plan_delete_deployment(&mut self, env: &str, app: &str) -> AoResult<()> {
        self.ensure_collecting()?;
        let path = deployment_path(env, app);
        if !self.snapshot.contains(&path) {
            return self.missing(format!("deployment {path}"));
        }
        self.offer(&path, format!("Delete file {path}"))?;

        let root = root_path(app);
        if !self.app_has_remaining_deployments(app) && self.snapshot.contains(&root) {
            self.offer(
                &root,
                format!("No other deployment of {app} exists, delete root file {root}"),
            )?;
        }

        let about = about_path(env);
        if !self.env_has_remaining_apps(env) && self.snapshot.contains(&about) {
            self.offer(
                &about,
                format!("No other applications in {env}, delete environment file {about}"),
            )?;
        }
        Ok(())
    }

    /// Close the collecting phase and hand over the accepted deletions.
    pub fn finish(mut self) -> AoResult<DeletionPlan> {
        self.ensure_collecting()?;
        self.state = PlannerState::Confirmed;
        Ok(self.plan)
    }

    fn ensure_collecting(&self) -> AoResult<()> {
        match self.state {
            PlannerState::Collecting => Ok(()),
            PlannerState::Cancelled => Err(AoError::Cancelled),
            PlannerState::Confirmed => Err(AoError::Usage("delete plan already confirmed".into())),
        }
    }

    fn missing(&self, what: String) -> AoResult<()> {
        if self.force {
            tracing::debug!("{what} not present, skipped in forced mode");
            Ok(())
        } else {
            Err(AoError::NotFound(what))
        }
    }

    fn offer(&mut self, path: &str, reason: String) -> AoResult<()> {
        if self.plan.contains(path) {
            return Ok(());
        }
        if !self.force {
            let answer: Answer = self.confirm.prompt_yes_no_cancel(&reason)?.parse()?;
            match answer {
                Answer::Yes => {}
                Answer::No => {
                    tracing::debug!(%path, "deletion declined");
                    return Ok(());
                }
                Answer::Cancel => {
                    self.state = PlannerState::Cancelled;
                    self.plan = DeletionPlan::default();
                    return Err(AoError::Cancelled);
                }
            }
        }
        self.plan.entries.push(PlannedDeletion {
            path: path.to_string(),
            reason,
        });
        Ok(())
    }

    /// Any file other than `about.json` left under `env/` once planned deletions are gone.
    fn env_has_remaining_files(&self, env: &str) -> bool {
        let prefix = format!("{env}/");
        self.snapshot.paths().any(|p| {
            p.strip_prefix(&prefix)
                .is_some_and(|rest| rest != ABOUT_FILE)
                && !self.plan.contains(p)
        })
    }

    /// Any deployment left in `env` once planned deletions are gone.
    fn env_has_remaining_apps(&self, env: &str) -> bool {
        self.snapshot.paths().any(|p| {
            matches!(ConfigPath::classify(p), ConfigPath::Deployment { env: e, .. } if e == env)
                && !self.plan.contains(p)
        })
    }

    /// Any deployment of `app` left in any environment once planned deletions are gone.
    fn app_has_remaining_deployments(&self, app: &str) -> bool {
        self.snapshot.paths().any(|p| {
            matches!(ConfigPath::classify(p), ConfigPath::Deployment { app: a, .. } if a == app)
                && !self.plan.contains(p)
        })
    }
}

/// Remove every planned path with a single snapshot write.
///
/// An empty plan writes nothing. Returns the snapshot that was submitted.
pub async fn commit_plan(
    client: &SnapshotClient,
    affiliation: &str,
    snapshot: &Snapshot,
    plan: &DeletionPlan,
) -> AoResult<Snapshot> {
    if plan.is_empty() {
        tracing::info!("nothing to delete");
        return Ok(snapshot.clone());
    }
    let next = plan.apply(snapshot);
    client.write_snapshot(affiliation, &next).await?;
    tracing::info!(deleted = plan.len(), "delete plan committed");
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::snapshot_of;

    fn never(_: &str) -> AoResult<String> {
        panic!("forced mode must not prompt")
    }

    fn scripted(answers: &[&'static str]) -> impl FnMut(&str) -> AoResult<String> {
        let mut answers = answers.to_vec().into_iter();
        move |_text: &str| {
            answers
                .next()
                .map(str::to_string)
                .ok_or_else(|| AoError::Prompt("script exhausted".into()))
        }
    }

    fn planned(plan: &DeletionPlan) -> Vec<&str> {
        plan.paths().collect()
    }

    #[test]
    fn delete_file_then_apply_removes_exactly_that_path() {
        let snapshot = snapshot_of(&["dev/about.json", "dev/app1.json", "app1.json"]);
        let mut planner = DeletePlanner::new(&snapshot, never).forced(true);
        planner.plan_delete_file("dev/app1.json").unwrap();
        let plan = planner.finish().unwrap();
        let next = plan.apply(&snapshot);

        let mut expected = snapshot.files.clone();
        expected.remove("dev/app1.json");
        assert_eq!(
            next.files.keys().collect::<Vec<_>>(),
            expected.keys().collect::<Vec<_>>()
        );
        assert_eq!(next.content("app1.json"), snapshot.content("app1.json"));
    }

    #[test]
    fn missing_file_fails_unless_forced() {
        let snapshot = snapshot_of(&["app1.json"]);
        let mut planner = DeletePlanner::new(&snapshot, never);
        assert!(matches!(
            planner.plan_delete_file("nope.json"),
            Err(AoError::NotFound(_))
        ));

        let mut forced = DeletePlanner::new(&snapshot, never).forced(true);
        forced.plan_delete_file("nope.json").unwrap();
        assert!(forced.finish().unwrap().is_empty());
    }

    #[test]
    fn delete_app_cascades_about_when_last_deployment() {
        let snapshot = snapshot_of(&["dev/about.json", "dev/app1.json", "app1.json"]);
        let mut planner = DeletePlanner::new(&snapshot, never).forced(true);
        planner.plan_delete_app("app1").unwrap();
        let plan = planner.finish().unwrap();
        assert_eq!(
            planned(&plan),
            vec!["dev/app1.json", "dev/about.json", "app1.json"]
        );
        assert!(plan.entries()[1].reason.contains("No other deployments in dev"));
    }

    #[test]
    fn delete_app_keeps_about_while_other_env_files_remain() {
        let snapshot = snapshot_of(&[
            "dev/about.json",
            "dev/app1.json",
            "dev/secrets.properties",
            "app1.json",
        ]);
        let mut planner = DeletePlanner::new(&snapshot, never).forced(true);
        planner.plan_delete_app("app1").unwrap();
        let plan = planner.finish().unwrap();
        assert_eq!(planned(&plan), vec!["dev/app1.json", "app1.json"]);
    }

    #[test]
    fn delete_deployment_only_counts_application_files() {
        let snapshot = snapshot_of(&[
            "dev/about.json",
            "dev/app1.json",
            "dev/secrets.properties",
            "app1.json",
        ]);
        let mut planner = DeletePlanner::new(&snapshot, never).forced(true);
        planner.plan_delete_deployment("dev", "app1").unwrap();
        let plan = planner.finish().unwrap();
        assert_eq!(
            planned(&plan),
            vec!["dev/app1.json", "app1.json", "dev/about.json"]
        );
    }

    #[test]
    fn delete_app_keeps_about_of_shared_environments() {
        let snapshot = snapshot_of(&[
            "dev/about.json",
            "dev/app1.json",
            "dev/app2.json",
            "test/about.json",
            "test/app1.json",
            "app1.json",
            "app2.json",
        ]);
        let mut planner = DeletePlanner::new(&snapshot, never).forced(true);
        planner.plan_delete_app("app1").unwrap();
        let plan = planner.finish().unwrap();
        assert_eq!(
            planned(&plan),
            vec!["dev/app1.json", "test/app1.json", "test/about.json", "app1.json"]
        );
    }

    #[test]
    fn delete_deployment_keeps_about_when_other_apps_remain() {
        let snapshot = snapshot_of(&[
            "dev/about.json",
            "dev/app1.json",
            "dev/app2.json",
            "app1.json",
            "app2.json",
        ]);
        let mut planner = DeletePlanner::new(&snapshot, never).forced(true);
        planner.plan_delete_deployment("dev", "app1").unwrap();
        let plan = planner.finish().unwrap();
        assert_eq!(planned(&plan), vec!["dev/app1.json", "app1.json"]);
    }

    #[test]
    fn delete_deployment_keeps_root_when_deployed_elsewhere() {
        let snapshot = snapshot_of(&[
            "dev/about.json",
            "dev/app1.json",
            "test/about.json",
            "test/app1.json",
            "app1.json",
        ]);
        let mut planner = DeletePlanner::new(&snapshot, never).forced(true);
        planner.plan_delete_deployment("dev", "app1").unwrap();
        let plan = planner.finish().unwrap();
        assert_eq!(planned(&plan), vec!["dev/app1.json", "dev/about.json"]);
    }

    #[test]
    fn missing_deployment_is_not_found_unless_forced() {
        let snapshot = snapshot_of(&["dev/about.json"]);
        let mut planner = DeletePlanner::new(&snapshot, never);
        let err = planner.plan_delete_deployment("dev", "app1").unwrap_err();
        assert_eq!(err.to_string(), "no such deployment dev/app1.json");

        let mut forced = DeletePlanner::new(&snapshot, never).forced(true);
        forced.plan_delete_deployment("dev", "app1").unwrap();
        assert!(forced.finish().unwrap().is_empty());
    }

    #[test]
    fn delete_env_cascades_roots_of_apps_only_deployed_there() {
        let snapshot = snapshot_of(&[
            "dev/about.json",
            "dev/app1.json",
            "dev/app2.json",
            "test/app2.json",
            "app1.json",
            "app2.json",
        ]);
        let mut planner = DeletePlanner::new(&snapshot, never).forced(true);
        planner.plan_delete_env("dev").unwrap();
        let plan = planner.finish().unwrap();
        assert_eq!(
            planned(&plan),
            vec!["dev/about.json", "dev/app1.json", "app1.json", "dev/app2.json"]
        );
    }

    #[test]
    fn declining_a_deployment_suppresses_its_cascade() {
        let snapshot = snapshot_of(&["dev/about.json", "dev/app1.json", "app1.json"]);
        let mut planner = DeletePlanner::new(&snapshot, scripted(&["N", "Y"]));
        planner.plan_delete_app("app1").unwrap();
        let plan = planner.finish().unwrap();
        assert_eq!(planned(&plan), vec!["app1.json"]);
    }

    #[test]
    fn cancel_discards_earlier_acceptances() {
        let snapshot = snapshot_of(&["dev/about.json", "dev/app1.json", "app1.json"]);
        let mut planner = DeletePlanner::new(&snapshot, scripted(&["Y", "C"]));
        let err = planner.plan_delete_app("app1").unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(planner.state(), PlannerState::Cancelled);
        assert!(planner.plan().is_empty());
        assert!(planner.finish().unwrap_err().is_cancelled());
    }

    #[test]
    fn unexpected_answer_is_an_error() {
        let snapshot = snapshot_of(&["app1.json"]);
        let mut planner = DeletePlanner::new(&snapshot, scripted(&["maybe"]));
        assert!(matches!(
            planner.plan_delete_file("app1.json"),
            Err(AoError::Prompt(_))
        ));
    }
}
