use std::time::Duration;

use collector_core::{compose_query, CollectParams, FormValues, Msg, PanelView, TargetId};
use collector_engine::HistoryEntry;
use collector_logging::{ctx_info, ContextLabel};
use url::Url;

use crate::background::{Orchestrator, PanelNotice};

/// One transient panel session over the long-lived orchestrator.
///
/// Opening the session performs the activation self-heal; everything else is
/// a thin, render-oriented wrapper around state-machine messages and store
/// reads.
pub struct PanelSession<'a> {
    orchestrator: &'a mut Orchestrator,
}

impl<'a> PanelSession<'a> {
    pub fn open(
        orchestrator: &'a mut Orchestrator,
        foreground: Option<TargetId>,
    ) -> (Self, PanelView) {
        collector_logging::set_context(ContextLabel::Panel);
        let view = orchestrator.open_panel(foreground);
        (Self { orchestrator }, view)
    }

    pub fn view(&self) -> PanelView {
        self.orchestrator.view()
    }

    /// Remembers the form values for this and future sessions.
    pub fn submit_form(&mut self, form: FormValues) {
        self.orchestrator.dispatch(Msg::FormEdited { form });
    }

    /// Requests a collection on `target` and blocks this session until it
    /// settles, returning the final view.
    pub fn collect(&mut self, target: TargetId, params: CollectParams) -> PanelView {
        let deadline =
            Duration::from_millis(u64::from(params.scroll_count) * params.scroll_interval_ms)
                + Duration::from_secs(32);
        self.orchestrator
            .dispatch(Msg::CollectRequested { target, params });
        self.orchestrator.wait_while_collecting(deadline)
    }

    /// Asks for a new target at `url`; the resume scheduler will surface a
    /// fresh panel once it is ready.
    pub fn open_target(&mut self, url: String) {
        self.orchestrator.dispatch(Msg::OpenTargetRequested { url });
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.orchestrator.store().history()
    }

    pub fn delete_history(&mut self, id: i64) {
        self.orchestrator.store().remove_history(id);
    }

    pub fn clear_seen(&mut self) {
        self.orchestrator.store().clear_seen();
    }
}

/// Joins addresses the way the clipboard collaborator expects them.
pub fn copy_payload(view: &PanelView) -> String {
    view.addresses.join(", ")
}

/// Splits the comma-separated exclusion input into usable terms.
pub fn parse_exclude_terms(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Builds the search URL for a composed query.
pub fn build_search_url(base: &str, query: &str) -> anyhow::Result<String> {
    let url = Url::parse_with_params(base, &[("keywords", query)])?;
    Ok(url.into())
}

/// The full headless panel flow: remember the form, open a search target,
/// wait for the resume scheduler to surface a fresh panel on it, collect.
pub fn run_panel_flow(
    orchestrator: &mut Orchestrator,
    form: FormValues,
    search_base: &str,
) -> anyhow::Result<PanelView> {
    let query = compose_query(&form.keywords);
    if query.is_empty() {
        anyhow::bail!("no usable query terms in {:?}", form.keywords);
    }
    let params = CollectParams {
        scroll_count: form.scroll_count,
        scroll_interval_ms: orchestrator.store().snapshot().scroll_speed,
        exclude_terms: parse_exclude_terms(&form.exclude_keywords),
        unique_only: form.include_unique,
    };

    let (mut session, _view) = PanelSession::open(orchestrator, None);
    session.submit_form(form);

    let search_url = build_search_url(search_base, &query)?;
    ctx_info!("opening search target at {}", search_url);
    session.open_target(search_url);
    // The panel that started the navigation is dismissed here.
    drop(session);

    // The resume notice stands in for the user reopening the panel.
    let resumed = orchestrator.pump_until(Duration::from_secs(60), |notice| {
        matches!(notice, PanelNotice::Resume(_))
    });
    let Some(PanelNotice::Resume(target)) = resumed else {
        anyhow::bail!("search target never became ready");
    };

    let (mut session, _view) = PanelSession::open(orchestrator, Some(target));
    Ok(session.collect(target, params))
}
