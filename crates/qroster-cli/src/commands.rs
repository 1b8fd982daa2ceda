//! Subcommand implementations. Every command writes its result to `out`,
//! either as text or as one pretty-printed JSON document.

use std::io::Write;
use std::time::Instant;

use qroster_core::{
    ComplianceReport, EditOutcome, Notice, Reconciler, RosterConfig, SchoolQuery, SyncOutcome,
    dashboard_stats, login,
};
use qroster_error::{Result, RosterError};
use qroster_remote::{GoTrueProvider, IdentityProvider, OfflineRemote, PostgrestStore, RemoteStore};
use qroster_store::{FileStore, LocalMirror};
use qroster_types::{ChecklistItem, School, Scope, Session, area_by_id};
use serde::Serialize;
use serde_json::json;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{debug, warn};

use crate::Command;

type CliReconciler = Reconciler<FileStore, Box<dyn RemoteStore>>;

pub(crate) struct Context {
    pub config: RosterConfig,
    pub json: bool,
    pub offline: bool,
}

impl Context {
    fn mirror(&self) -> Result<LocalMirror<FileStore>> {
        let store = FileStore::open(&self.config.data_dir)?;
        Ok(LocalMirror::with_slots(
            store,
            &self.config.roster_slot,
            &self.config.session_slot,
        ))
    }

    fn remote(&self) -> Result<Box<dyn RemoteStore>> {
        match self.config.endpoint() {
            Some(endpoint) if !self.offline => Ok(Box::new(PostgrestStore::new(endpoint)?)),
            _ => Ok(Box::new(OfflineRemote)),
        }
    }

    fn identity(&self) -> Result<Box<dyn IdentityProvider>> {
        match self.config.endpoint() {
            Some(endpoint) if !self.offline => Ok(Box::new(GoTrueProvider::new(endpoint)?)),
            _ => Ok(Box::new(OfflineRemote)),
        }
    }

    /// Reconciler with no network activity.
    fn load(&self) -> Result<CliReconciler> {
        Ok(Reconciler::load(self.mirror()?, self.remote()?))
    }

    /// Reconciler brought up to date for the stored session.
    fn bootstrap(&self) -> Result<CliReconciler> {
        Ok(Reconciler::bootstrap(self.mirror()?, self.remote()?))
    }

    fn emit<T: Serialize>(
        &self,
        out: &mut dyn Write,
        value: &T,
        text: impl FnOnce() -> String,
    ) -> Result<()> {
        if self.json {
            serde_json::to_writer_pretty(&mut *out, value)?;
            writeln!(out)?;
        } else {
            writeln!(out, "{}", text())?;
        }
        Ok(())
    }
}

pub(crate) fn execute(ctx: &Context, command: &Command, out: &mut dyn Write) -> Result<()> {
    debug!(command = command.name(), "running command");
    match command {
        Command::Login { email, password } => cmd_login(ctx, email, password, out),
        Command::Logout => cmd_logout(ctx, out),
        Command::Status => cmd_status(ctx, out),
        Command::List { area, kind, search } => {
            let query = SchoolQuery {
                area_id: area.clone(),
                kind: *kind,
                search: search.clone(),
            };
            cmd_list(ctx, &query, out)
        }
        Command::Show { id } => cmd_show(ctx, id, out),
        Command::Edit { id, done, undo } => cmd_edit(ctx, id, done, undo, out),
        Command::Sync => cmd_sync(ctx, out),
        Command::Stats => cmd_stats(ctx, out),
        Command::Report { id } => cmd_report(ctx, id, out),
    }
}

fn require_session(rec: &CliReconciler) -> Result<&Session> {
    rec.session().ok_or(RosterError::NotSignedIn)
}

fn find_accessible<'a>(rec: &'a CliReconciler, id: &str) -> Result<&'a School> {
    require_session(rec)?;
    rec.accessible_schools()
        .into_iter()
        .find(|school| school.id == id)
        .ok_or_else(|| RosterError::UnknownSchool(id.to_owned()))
}

fn scope_text(scope: &Scope) -> String {
    match scope {
        Scope::AllRegions => "all regions".to_owned(),
        Scope::Region(area) => area_by_id(area).map_or_else(|| area.clone(), |a| a.name.to_owned()),
        Scope::Unassigned => "no region".to_owned(),
    }
}

fn area_name(area_id: &str) -> &str {
    area_by_id(area_id).map_or(area_id, |area| area.name)
}

/// Notice headline for `outcome`, followed by its detail when there is one.
fn sync_text(outcome: Option<&SyncOutcome>) -> String {
    let Some(outcome) = outcome else {
        return "working offline with a local-only session".to_owned();
    };
    let notice = Notice::for_sync(outcome, Instant::now());
    let detail = match outcome {
        SyncOutcome::Replaced { schools } => Some(format!("{schools} schools")),
        SyncOutcome::EmptyIgnored => Some("remote is empty, local roster kept".to_owned()),
        SyncOutcome::Failed { reason } | SyncOutcome::Malformed { reason } => Some(reason.clone()),
        SyncOutcome::Unreachable => None,
    };
    detail.map_or_else(
        || notice.text.to_owned(),
        |detail| format!("{}: {detail}", notice.text),
    )
}

fn cmd_login(ctx: &Context, email: &str, password: &str, out: &mut dyn Write) -> Result<()> {
    let identity = ctx.identity()?;
    let session = login(
        &*identity,
        email,
        password,
        &ctx.config.fallback_password,
    )?;
    if session.scope == Scope::Unassigned {
        return Err(RosterError::config(format!(
            "`{}` is not assigned to any region",
            session.email
        )));
    }
    let mut rec = ctx.load()?;
    let outcome = rec.sign_in(session);
    let session = require_session(&rec)?;
    let value = json!({
        "email": session.email,
        "role": session.role,
        "scope": session.scope,
        "local_only": session.local_only,
        "connectivity": rec.connectivity(),
        "sync": outcome,
    });
    ctx.emit(out, &value, || {
        format!(
            "signed in as {} ({}, {})\n{}",
            session.display_name,
            session.role,
            scope_text(&session.scope),
            sync_text(outcome.as_ref()),
        )
    })
}

fn cmd_logout(ctx: &Context, out: &mut dyn Write) -> Result<()> {
    let mut rec = ctx.load()?;
    let token = rec
        .session()
        .filter(|s| !s.local_only)
        .and_then(|s| s.access_token.clone());
    if let Some(token) = token {
        if let Err(err) = ctx.identity()?.sign_out(&token) {
            warn!(error = %err, "identity provider sign-out failed");
        }
    }
    let previous = rec.sign_out();
    let value = json!({ "signed_out": previous.is_some() });
    ctx.emit(out, &value, || {
        if previous.is_some() { "signed out" } else { "no active session" }.to_owned()
    })
}

fn cmd_status(ctx: &Context, out: &mut dyn Write) -> Result<()> {
    let rec = ctx.bootstrap()?;
    let visible = rec.accessible_schools().len();
    let value = json!({
        "session": rec.session(),
        "connectivity": rec.connectivity(),
        "schools_total": rec.roster().len(),
        "schools_visible": visible,
    });
    ctx.emit(out, &value, || {
        let who = rec.session().map_or_else(
            || "not signed in".to_owned(),
            |s| {
                let mode = if s.local_only { ", local-only" } else { "" };
                format!(
                    "{} <{}> ({}, {}{mode})",
                    s.display_name,
                    s.email,
                    s.role,
                    scope_text(&s.scope)
                )
            },
        );
        format!(
            "session:      {who}\nconnectivity: {}\nschools:      {visible} visible of {}",
            rec.connectivity(),
            rec.roster().len()
        )
    })
}

fn cmd_list(ctx: &Context, query: &SchoolQuery, out: &mut dyn Write) -> Result<()> {
    let rec = ctx.bootstrap()?;
    require_session(&rec)?;
    let schools = query.apply(rec.accessible_schools());
    ctx.emit(out, &schools, || {
        if schools.is_empty() {
            return "no schools match".to_owned();
        }
        schools
            .iter()
            .map(|s| {
                format!(
                    "{:>3}%  {:<14} {:<8} {}  {}",
                    s.completion_percentage(),
                    s.id,
                    s.kind,
                    area_name(&s.area_id),
                    s.name
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    })
}

fn checklist_text(school: &School) -> String {
    let mut text = format!(
        "{} ({})\n{} | {} | accredited {}\n",
        school.name,
        school.id,
        school.kind,
        area_name(&school.area_id),
        school.accreditation_date
    );
    for (i, (item, done)) in school.checklist().iter().enumerate() {
        let mark = if done { "[x]" } else { "[ ]" };
        text.push_str(&format!("{:>2}. {mark} {:<18} {}\n", i + 1, item.key(), item.label()));
    }
    text.push_str(&format!("completion: {}%", school.completion_percentage()));
    text
}

fn cmd_show(ctx: &Context, id: &str, out: &mut dyn Write) -> Result<()> {
    let rec = ctx.bootstrap()?;
    let school = find_accessible(&rec, id)?;
    ctx.emit(out, school, || checklist_text(school))
}

fn cmd_edit(
    ctx: &Context,
    id: &str,
    done: &[ChecklistItem],
    undo: &[ChecklistItem],
    out: &mut dyn Write,
) -> Result<()> {
    let mut rec = ctx.bootstrap()?;
    let mut checklist = *find_accessible(&rec, id)?.checklist();
    for &item in done {
        checklist.set(item, true);
    }
    for &item in undo {
        checklist.set(item, false);
    }

    let outcome = rec.update_checklist(id, checklist)?;
    let notice = Notice::for_edit(outcome, Instant::now());
    let completion = rec.roster().get(id).map(School::completion_percentage);
    let value = json!({
        "school_id": id,
        "outcome": outcome,
        "completion_percentage": completion,
        "connectivity": rec.connectivity(),
    });
    ctx.emit(out, &value, || match (outcome, completion) {
        (EditOutcome::NotFound, _) | (_, None) => notice.text.to_owned(),
        (_, Some(pct)) => format!("{}: {id} is now {pct}% complete", notice.text),
    })
}

fn cmd_sync(ctx: &Context, out: &mut dyn Write) -> Result<()> {
    let mut rec = ctx.load()?;
    let outcome = rec.force_sync();
    let value = json!({
        "sync": outcome,
        "connectivity": rec.connectivity(),
        "schools_total": rec.roster().len(),
    });
    ctx.emit(out, &value, || sync_text(Some(&outcome)))
}

fn cmd_stats(ctx: &Context, out: &mut dyn Write) -> Result<()> {
    let rec = ctx.bootstrap()?;
    require_session(&rec)?;
    let stats = dashboard_stats(&rec.accessible_schools());
    ctx.emit(out, &stats, || {
        let mut text = format!(
            "schools:    {}\naverage:    {}%\ncompleted:  {}\nregions:    {}\n\nby region:\n",
            stats.total_schools,
            stats.average_completion,
            stats.completed_schools,
            stats.administrators
        );
        for area in stats.by_area.iter().filter(|a| a.schools > 0) {
            text.push_str(&format!(
                "  {:>3}%  {} ({})\n",
                area.average_completion, area.name, area.schools
            ));
        }
        text.push_str("\nby type:\n");
        for kind in &stats.by_type {
            text.push_str(&format!(
                "  {:>3}%  {} ({})\n",
                kind.average_completion, kind.kind, kind.schools
            ));
        }
        text.trim_end().to_owned()
    })
}

fn today() -> Result<String> {
    OffsetDateTime::now_utc()
        .date()
        .format(format_description!("[year]-[month]-[day]"))
        .map_err(|err| RosterError::internal(format!("date formatting: {err}")))
}

fn cmd_report(ctx: &Context, id: &str, out: &mut dyn Write) -> Result<()> {
    let rec = ctx.bootstrap()?;
    let school = find_accessible(&rec, id)?;
    let report = ComplianceReport::build(school, today()?);
    ctx.emit(out, &report, || report.to_string())
}
