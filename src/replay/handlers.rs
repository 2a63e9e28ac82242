//! Per-type interaction sequences.
//!
//! Each `plan_*` function runs against the document as it is when replay starts,
//! resolves the controls it needs to `NodeKey`s, and schedules deferred steps that
//! perform the actual writes and event dispatches.

use scraper::ElementRef;

use crate::dom::document::{
    Document, EventKind, NodeKey, closest, is_ancestor_of, is_native_toggle, text_content,
    trimmed_text,
};
use crate::dom::selectors::{
    DROPDOWN_TRIGGER, LABEL, LABELLED_ELEMENT, LISTBOX, NATIVE_SELECT, NATIVE_TOGGLE,
    OPENED_DROPDOWN_OPTION, SELECT_OPTION, TEXT_INPUT, TOGGLE,
};
use crate::form::answer_model::OptionRef;
use crate::form::classifier::choice_options;
use crate::form::error::FormError;
use crate::form::form_model::QuestionType;
use crate::form::normalize::{CHOOSE_PLACEHOLDER, aria_label_candidates, toggle_label};
use crate::replay::replayer::ReplayConfig;
use crate::replay::scheduler::{Scheduler, TaskLabel};
use crate::trace::logger::TraceLogger;
use crate::trace::trace::{Outcome, Phase, TraceEvent};

/// Everything a handler needs to know about the question it is planning for.
pub struct PlanContext<'t> {
    pub question_id: usize,
    pub question_type: QuestionType,
    pub config: ReplayConfig,
    /// Keys of every discovered question container, in question order.
    pub containers: Vec<NodeKey>,
    pub tracer: &'t TraceLogger,
}

impl PlanContext<'_> {
    fn label(&self, step: &'static str) -> TaskLabel {
        TaskLabel {
            question_id: self.question_id,
            question_type: self.question_type,
            step,
        }
    }

    fn skipped(&self, step: &str, reason: impl ToString) {
        self.tracer.log(
            TraceEvent::now(Phase::Replay, step, Outcome::Skipped)
                .with_question(self.question_id)
                .with_type(self.question_type)
                .with_detail(reason),
        );
    }

    fn scheduled(&self, step: &str) {
        self.tracer.log(
            TraceEvent::now(Phase::Replay, step, Outcome::Scheduled)
                .with_question(self.question_id)
                .with_type(self.question_type),
        );
    }
}

/// How a toggle is driven: native inputs get their property written, anything
/// else gets a synthetic click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Native(NodeKey),
    Synthetic(NodeKey),
}

pub fn resolve_toggle(doc: &Document, el: ElementRef<'_>) -> Result<Toggle, FormError> {
    if is_native_toggle(el) {
        return Ok(Toggle::Native(doc.require_key(el)?));
    }
    if let Some(input) = el.select(&NATIVE_TOGGLE).next() {
        return Ok(Toggle::Native(doc.require_key(input)?));
    }
    if let Some(input) = closest(el, &LABEL).and_then(|label| label.select(&NATIVE_TOGGLE).next()) {
        return Ok(Toggle::Native(doc.require_key(input)?));
    }
    Ok(Toggle::Synthetic(doc.require_key(el)?))
}

pub fn activate(doc: &mut Document, toggle: Toggle) -> Result<(), FormError> {
    match toggle {
        Toggle::Native(key) => {
            doc.set_checked(key, true)?;
            doc.dispatch_all(key, &[EventKind::Change, EventKind::Input])
        }
        Toggle::Synthetic(key) => doc.click(key),
    }
}

fn fill_text(doc: &mut Document, key: NodeKey, text: &str) -> Result<(), FormError> {
    doc.set_value(key, text)?;
    doc.dispatch(key, EventKind::Input)
}

fn press_option(doc: &mut Document, key: NodeKey) -> Result<(), FormError> {
    doc.focus(key)?;
    doc.click(key)?;
    doc.dispatch_all(
        key,
        &[EventKind::MouseDown, EventKind::MouseUp, EventKind::Change],
    )
}

// ============================================================================
// multiple_choice
// ============================================================================

pub fn plan_multiple_choice(
    doc: &Document,
    container: ElementRef<'_>,
    records: &[OptionRef],
    ctx: &PlanContext<'_>,
    scheduler: &mut Scheduler,
) -> Result<(), FormError> {
    let toggles = choice_options(container);
    let other_input = container
        .select(&TEXT_INPUT)
        .next()
        .map(|el| doc.require_key(el))
        .transpose()?;

    for record in records {
        if record.is_skip() {
            ctx.skipped("multiple_choice", "record marked SKIP");
            continue;
        }

        let wanted = record.text.trim();
        let matched = toggles.iter().find(|(option, label)| {
            toggle_label(&text_content(*label)) == wanted || record.position() == Some(option.id)
        });
        let Some((_, label)) = matched else {
            ctx.skipped(
                "multiple_choice",
                format!("no option matches id={} text={:?}", record.id, record.text),
            );
            continue;
        };

        let toggle = resolve_toggle(doc, *label)?;
        let other = record
            .other_text
            .clone()
            .filter(|text| !text.is_empty())
            .zip(other_input);

        scheduler.schedule(
            ctx.config.control_delay,
            ctx.label("multiple_choice"),
            Box::new(move |doc, _| {
                activate(doc, toggle)?;
                if let Some((text, key)) = other {
                    fill_text(doc, key, &text)?;
                }
                Ok(())
            }),
        );
        ctx.scheduled("multiple_choice");
    }
    Ok(())
}

// ============================================================================
// checkbox
// ============================================================================

pub fn plan_checkbox(
    doc: &Document,
    container: ElementRef<'_>,
    records: &[OptionRef],
    ctx: &PlanContext<'_>,
    scheduler: &mut Scheduler,
) -> Result<(), FormError> {
    let toggles: Vec<ElementRef<'_>> = container.select(&TOGGLE).collect();

    for record in records {
        if record.is_skip() {
            ctx.skipped("checkbox", "record marked SKIP");
            continue;
        }
        let Some(el) = record.position().and_then(|pos| toggles.get(pos)) else {
            ctx.skipped("checkbox", format!("no toggle at position {}", record.id));
            continue;
        };

        let key = doc.require_key(*el)?;
        let toggle = if is_native_toggle(*el) {
            Toggle::Native(key)
        } else {
            Toggle::Synthetic(key)
        };

        scheduler.schedule(
            ctx.config.control_delay,
            ctx.label("checkbox"),
            Box::new(move |doc, _| activate(doc, toggle)),
        );
        ctx.scheduled("checkbox");
    }
    Ok(())
}

// ============================================================================
// dropdown
// ============================================================================

pub fn plan_dropdown(
    doc: &Document,
    container: ElementRef<'_>,
    records: &[OptionRef],
    ctx: &PlanContext<'_>,
    scheduler: &mut Scheduler,
) -> Result<(), FormError> {
    let Some(record) = records.first() else {
        ctx.skipped("dropdown", "no record");
        return Ok(());
    };
    if record.is_skip() {
        ctx.skipped("dropdown", "record marked SKIP");
        return Ok(());
    }

    if let Some(select) = container.select(&NATIVE_SELECT).next() {
        let key = doc.require_key(select)?;
        let row = native_row(select, record).ok_or_else(|| {
            FormError::NodeMissing(format!(
                "select option for id={} text={:?}",
                record.id, record.text
            ))
        })?;

        scheduler.schedule(
            ctx.config.control_delay,
            ctx.label("dropdown_select"),
            Box::new(move |doc, _| {
                doc.focus(key)?;
                doc.set_selected_index(key, row)?;
                doc.dispatch_all(
                    key,
                    &[
                        EventKind::Focus,
                        EventKind::Change,
                        EventKind::Blur,
                        EventKind::Input,
                    ],
                )
            }),
        );
        ctx.scheduled("dropdown_select");
        return Ok(());
    }

    let trigger = container
        .select(&DROPDOWN_TRIGGER)
        .next()
        .ok_or_else(|| FormError::NodeMissing("dropdown trigger".into()))?;
    let trigger_key = doc.require_key(trigger)?;
    let own_listbox = container
        .select(&LISTBOX)
        .next()
        .map(|el| doc.require_key(el))
        .transpose()?;

    let pick = OptionPick {
        record: record.clone(),
        own_container: ctx.containers.get(ctx.question_id).copied(),
        other_containers: ctx
            .containers
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != ctx.question_id)
            .map(|(_, key)| *key)
            .collect(),
        own_listbox,
        open_label: ctx.label("dropdown_options"),
        click_label: ctx.label("dropdown_click_option"),
        config: ctx.config.clone(),
    };

    scheduler.schedule(
        ctx.config.control_delay,
        ctx.label("dropdown_open"),
        Box::new(move |doc, sched| {
            doc.click(trigger_key)?;
            doc.dispatch_all(trigger_key, &[EventKind::MouseDown, EventKind::MouseUp])?;
            let delay = pick.config.dropdown_open_delay;
            let label = pick.open_label.clone();
            sched.schedule(delay, label, Box::new(move |doc, sched| pick.choose(doc, sched)));
            Ok(())
        }),
    );
    ctx.scheduled("dropdown_open");
    Ok(())
}

/// Row of a native select to pick: the placeholder row shifts every id by one.
fn native_row(select: ElementRef<'_>, record: &OptionRef) -> Option<usize> {
    let rows: Vec<ElementRef<'_>> = select.select(&SELECT_OPTION).collect();
    match record.position() {
        Some(pos) => Some(pos + 1).filter(|row| *row < rows.len()),
        None => rows
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, row)| trimmed_text(**row) == record.text.trim())
            .map(|(row, _)| row),
    }
}

/// Second and third tier of a custom dropdown, run once the panel had time to open.
struct OptionPick {
    record: OptionRef,
    own_container: Option<NodeKey>,
    other_containers: Vec<NodeKey>,
    own_listbox: Option<NodeKey>,
    open_label: TaskLabel,
    click_label: TaskLabel,
    config: ReplayConfig,
}

impl OptionPick {
    /// Options may be portaled anywhere in the document, but never inside
    /// another question's container.
    fn in_scope(&self, doc: &Document, el: ElementRef<'_>) -> bool {
        if let Some(own) = self.own_container.and_then(|key| doc.element(key)) {
            if is_ancestor_of(own, el) {
                return true;
            }
        }
        !self
            .other_containers
            .iter()
            .filter_map(|key| doc.element(*key))
            .any(|other| is_ancestor_of(other, el))
    }

    fn matches(&self, position: usize, text: &str) -> bool {
        match self.record.position() {
            Some(id) => id == position,
            None => text == self.record.text.trim(),
        }
    }

    fn choose(self, doc: &Document, sched: &mut Scheduler) -> Result<(), FormError> {
        let rows: Vec<ElementRef<'_>> = doc
            .select_all(&OPENED_DROPDOWN_OPTION)
            .into_iter()
            .filter(|el| self.in_scope(doc, *el))
            .collect();

        if rows.is_empty() {
            return self.choose_from_aria_label(doc, sched);
        }

        let target = rows
            .iter()
            .enumerate()
            .find(|(position, row)| {
                let text = trimmed_text(**row);
                !text.is_empty() && text != CHOOSE_PLACEHOLDER && self.matches(*position, &text)
            })
            .map(|(_, row)| doc.require_key(*row))
            .transpose()?
            .ok_or_else(|| {
                FormError::NodeMissing(format!(
                    "opened dropdown option for id={} text={:?}",
                    self.record.id, self.record.text
                ))
            })?;

        sched.schedule(
            self.config.option_click_delay,
            self.click_label,
            Box::new(move |doc, _| press_option(doc, target)),
        );
        Ok(())
    }

    fn choose_from_aria_label(self, doc: &Document, sched: &mut Scheduler) -> Result<(), FormError> {
        let listbox = match self.own_listbox.and_then(|key| doc.element(key)) {
            Some(el) => el,
            None => doc
                .select_all(&LISTBOX)
                .into_iter()
                .find(|el| self.in_scope(doc, *el))
                .ok_or_else(|| FormError::NodeMissing("listbox".into()))?,
        };

        let label = listbox.value().attr("aria-label").unwrap_or_default();
        let candidates = aria_label_candidates(label);
        let candidate = candidates
            .iter()
            .enumerate()
            .find_map(|(position, candidate)| {
                candidate
                    .as_deref()
                    .filter(|text| self.matches(position, text))
            })
            .ok_or_else(|| {
                FormError::NodeMissing(format!("aria-label option for id={}", self.record.id))
            })?;

        let clickable = listbox
            .select(&LABELLED_ELEMENT)
            .find(|el| {
                let attr = |name| el.value().attr(name).unwrap_or_default();
                attr("aria-label").contains(candidate) || attr("title").contains(candidate)
            })
            .ok_or_else(|| FormError::NodeMissing(format!("element labelled {:?}", candidate)))?;
        let target = doc.require_key(clickable)?;

        sched.schedule(
            self.config.option_click_delay,
            self.click_label,
            Box::new(move |doc, _| press_option(doc, target)),
        );
        Ok(())
    }
}

// ============================================================================
// short_answer / paragraph
// ============================================================================

pub fn plan_text(
    doc: &Document,
    container: ElementRef<'_>,
    records: &[OptionRef],
    ctx: &PlanContext<'_>,
    scheduler: &mut Scheduler,
) -> Result<(), FormError> {
    let Some(record) = records.first() else {
        ctx.skipped("text", "no record");
        return Ok(());
    };

    let text = if record.text.trim().is_empty() {
        record.other_text.clone().unwrap_or_default()
    } else {
        record.text.clone()
    };
    if text.trim().is_empty() || text.trim().eq_ignore_ascii_case("skip") {
        ctx.skipped("text", "empty or skip");
        return Ok(());
    }

    let input = container
        .select(&TEXT_INPUT)
        .next()
        .ok_or_else(|| FormError::NodeMissing("text input".into()))?;
    let key = doc.require_key(input)?;

    scheduler.schedule(
        ctx.config.control_delay,
        ctx.label("text"),
        Box::new(move |doc, _| fill_text(doc, key, &text)),
    );
    ctx.scheduled("text");
    Ok(())
}
