use std::collections::HashSet;

use xmltree::Element;

use super::Removal;

const EAGLE: &str = "eagle";
const FADE_IN: &str = "buildin";
const TARGET_ATTR: &str = "o";

/// Object ids a path step points at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepRefs {
    pub eagle: Option<String>,
    pub fade_in: Option<String>,
}

impl StepRefs {
    pub(crate) fn of(step: &Element) -> Self {
        let target = |name: &str| {
            step.get_child(name)
                .and_then(|action| action.attributes.get(TARGET_ATTR))
                .cloned()
        };
        Self {
            eagle: target(EAGLE),
            fade_in: target(FADE_IN),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepVerdict {
    Keep,
    Remove(Vec<Removal>),
}

impl StepVerdict {
    #[must_use]
    pub fn is_keep(&self) -> bool {
        matches!(self, StepVerdict::Keep)
    }
}

/// Decides, in document order, which path steps survive once `removed`
/// objects are gone.
///
/// A step whose eagle targets a removed object starts a cascade: it and every
/// later step are dropped.
#[must_use]
pub fn plan_step_removals(steps: &[StepRefs], removed: &HashSet<String>) -> Vec<StepVerdict> {
    steps
        .iter()
        .scan(false, |cascading, step| {
            let eagle_hit = step.eagle.as_ref().filter(|id| removed.contains(*id));
            let fade_in_hit = step.fade_in.as_ref().filter(|id| removed.contains(*id));
            *cascading |= eagle_hit.is_some();

            let mut reasons = Vec::new();
            if let Some(id) = eagle_hit {
                reasons.push(Removal::EagleTarget(id.clone()));
            }
            if let Some(id) = fade_in_hit {
                reasons.push(Removal::FadeInTarget(id.clone()));
            }
            if reasons.is_empty() && *cascading {
                reasons.push(Removal::ImplicitAction);
            }

            Some(if reasons.is_empty() {
                StepVerdict::Keep
            } else {
                StepVerdict::Remove(reasons)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(eagle: Option<&str>, fade_in: Option<&str>) -> StepRefs {
        StepRefs {
            eagle: eagle.map(str::to_string),
            fade_in: fade_in.map(str::to_string),
        }
    }

    fn removed(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|id| (*id).to_string()).collect()
    }

    #[test]
    fn nothing_removed_keeps_every_step() {
        let steps = vec![step(Some("1"), None), step(None, Some("2")), step(None, None)];
        let verdicts = plan_step_removals(&steps, &removed(&[]));
        assert!(verdicts.iter().all(StepVerdict::is_keep));
    }

    #[test]
    fn removed_eagle_cascades_to_trailing_steps() {
        let steps = vec![
            step(Some("1"), None),
            step(Some("2"), None),
            step(Some("5"), None),
            step(Some("3"), None),
            step(None, Some("4")),
        ];
        let verdicts = plan_step_removals(&steps, &removed(&["5"]));
        assert_eq!(
            verdicts,
            vec![
                StepVerdict::Keep,
                StepVerdict::Keep,
                StepVerdict::Remove(vec![Removal::EagleTarget("5".into())]),
                StepVerdict::Remove(vec![Removal::ImplicitAction]),
                StepVerdict::Remove(vec![Removal::ImplicitAction]),
            ]
        );
    }

    #[test]
    fn fade_in_removal_does_not_cascade() {
        let steps = vec![step(Some("1"), Some("9")), step(Some("2"), None)];
        let verdicts = plan_step_removals(&steps, &removed(&["9"]));
        assert_eq!(
            verdicts,
            vec![
                StepVerdict::Remove(vec![Removal::FadeInTarget("9".into())]),
                StepVerdict::Keep,
            ]
        );
    }

    #[test]
    fn both_references_are_reported_for_one_step() {
        let steps = vec![step(Some("7"), Some("8"))];
        let verdicts = plan_step_removals(&steps, &removed(&["7", "8"]));
        assert_eq!(
            verdicts,
            vec![StepVerdict::Remove(vec![
                Removal::EagleTarget("7".into()),
                Removal::FadeInTarget("8".into()),
            ])]
        );
    }

    #[test]
    fn cascade_is_not_reset_by_a_surviving_eagle() {
        let steps = vec![step(Some("5"), None), step(Some("1"), None)];
        let verdicts = plan_step_removals(&steps, &removed(&["5"]));
        assert_eq!(
            verdicts[1],
            StepVerdict::Remove(vec![Removal::ImplicitAction])
        );
    }

    #[test]
    fn targets_are_read_from_child_actions() {
        let element =
            Element::parse(r#"<s><eagle o="3"/><buildin o="4"/></s>"#.as_bytes()).expect("xml");
        assert_eq!(StepRefs::of(&element), step(Some("3"), Some("4")));
        let element = Element::parse(r#"<s><eagle/></s>"#.as_bytes()).expect("xml");
        assert_eq!(StepRefs::of(&element), step(None, None));
    }
}
