use runtime::frame::FrameCursor;
use scene::entity::EntityKey;
use scene::selection::SelectionSet;

/// What a pointer interaction did.
///
/// The chart never reaches into sibling components; the host reacts to
/// these values (shows tooltips, re-styles, persists selection).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionEvent {
    HighlightSet(EntityKey),
    HighlightCleared(EntityKey),
    TooltipShown(EntityKey),
    TooltipHidden,
    SelectionToggled { key: EntityKey, selected: bool },
    /// Emitted by the notify-only activation behavior.
    Activated(EntityKey),
}

/// How `activate` treats the selection set.
///
/// The bubble map toggles membership; the click-map variant only reports
/// the activation (its host opens a drill-down instead). Variants are
/// configuration, not subclasses.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ActivateBehavior {
    #[default]
    ToggleSelection,
    NotifyOnly,
}

#[derive(Debug, Copy, Clone, Default)]
pub struct Interaction {
    pub behavior: ActivateBehavior,
}

impl Interaction {
    pub fn new(behavior: ActivateBehavior) -> Self {
        Self { behavior }
    }

    /// Pointer entered a bubble (or empty space: `None` is a no-op).
    ///
    /// All interactions are no-ops while the time control is mid-drag.
    pub fn pointer_enter(
        &self,
        cursor: &FrameCursor,
        highlighted: &mut SelectionSet,
        selected: &SelectionSet,
        entity: Option<&EntityKey>,
    ) -> Vec<InteractionEvent> {
        let Some(key) = entity else {
            return Vec::new();
        };
        if cursor.dragging {
            return Vec::new();
        }

        let mut events = Vec::new();
        highlighted.insert(key.clone());
        events.push(InteractionEvent::HighlightSet(key.clone()));

        // Already-selected entities carry a label; no tooltip on top of it.
        if !selected.contains(key) {
            events.push(InteractionEvent::TooltipShown(key.clone()));
        }
        events
    }

    pub fn pointer_leave(
        &self,
        cursor: &FrameCursor,
        highlighted: &mut SelectionSet,
        entity: Option<&EntityKey>,
    ) -> Vec<InteractionEvent> {
        let Some(key) = entity else {
            return Vec::new();
        };
        if cursor.dragging {
            return Vec::new();
        }

        highlighted.remove(key);
        vec![
            InteractionEvent::HighlightCleared(key.clone()),
            InteractionEvent::TooltipHidden,
        ]
    }

    /// Click or tap on a bubble.
    pub fn activate(
        &self,
        cursor: &FrameCursor,
        highlighted: &mut SelectionSet,
        selected: &mut SelectionSet,
        entity: Option<&EntityKey>,
    ) -> Vec<InteractionEvent> {
        let Some(key) = entity else {
            return Vec::new();
        };
        if cursor.dragging {
            return Vec::new();
        }

        let mut events = Vec::new();
        highlighted.remove(key);
        events.push(InteractionEvent::TooltipHidden);

        match self.behavior {
            ActivateBehavior::ToggleSelection => {
                let now_selected = selected.toggle(key.clone());
                events.push(InteractionEvent::SelectionToggled {
                    key: key.clone(),
                    selected: now_selected,
                });
            }
            ActivateBehavior::NotifyOnly => {
                events.push(InteractionEvent::Activated(key.clone()));
            }
        }
        events
    }
}
