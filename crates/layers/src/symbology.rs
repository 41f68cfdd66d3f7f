use formats::settings::OpacitySettings;
use scene::entity::EntityKey;
use scene::selection::SelectionSet;

/// Opacity of one bubble under the current selection/highlight state.
///
/// Precedence, highest first:
/// 1. highlighted or selected itself: regular opacity
/// 2. any selection present: select-dim
/// 3. any highlight present: highlight-dim
/// 4. regular
pub fn opacity_for(
    key: &EntityKey,
    highlighted: &SelectionSet,
    selected: &SelectionSet,
    levels: &OpacitySettings,
) -> f64 {
    if highlighted.contains(key) || selected.contains(key) {
        return levels.regular;
    }
    if !selected.is_empty() {
        return levels.select_dim;
    }
    if !highlighted.is_empty() {
        return levels.highlight_dim;
    }
    levels.regular
}

#[cfg(test)]
mod tests {
    use super::opacity_for;
    use formats::settings::OpacitySettings;
    use scene::entity::EntityKey;
    use scene::selection::SelectionSet;

    fn k(s: &str) -> EntityKey {
        EntityKey::new(s)
    }

    #[test]
    fn everyone_is_regular_when_nothing_is_active() {
        let levels = OpacitySettings::default();
        let none = SelectionSet::new();
        assert_eq!(opacity_for(&k("a"), &none, &none, &levels), levels.regular);
    }

    #[test]
    fn selection_dims_everyone_else() {
        let levels = OpacitySettings::default();
        let mut selected = SelectionSet::new();
        selected.insert(k("a"));
        let highlighted = SelectionSet::new();

        assert_eq!(
            opacity_for(&k("a"), &highlighted, &selected, &levels),
            levels.regular
        );
        assert_eq!(
            opacity_for(&k("b"), &highlighted, &selected, &levels),
            levels.select_dim
        );
    }

    #[test]
    fn highlight_dims_less_aggressively_and_loses_to_selection() {
        let levels = OpacitySettings::default();
        let mut highlighted = SelectionSet::new();
        highlighted.insert(k("a"));
        let selected = SelectionSet::new();

        assert_eq!(
            opacity_for(&k("b"), &highlighted, &selected, &levels),
            levels.highlight_dim
        );

        // With a selection present, the selection dim wins for bystanders.
        let mut selected = SelectionSet::new();
        selected.insert(k("c"));
        assert_eq!(
            opacity_for(&k("b"), &highlighted, &selected, &levels),
            levels.select_dim
        );
        // The highlighted entity itself stays regular.
        assert_eq!(
            opacity_for(&k("a"), &highlighted, &selected, &levels),
            levels.regular
        );
    }
}
