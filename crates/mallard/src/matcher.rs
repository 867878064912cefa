//! Structural member matching between a contract and a concrete shape.
//!
//! Matching is pure descriptor comparison: name, kind, and full signature.
//! The report always covers every contract member; it never short-circuits
//! on the first miss, so a failed build can enumerate all mismatches at once.

use crate::shape::{MemberDesc, TypeShape};

/// Outcome for one contract member: the index of its matched counterpart
/// on the target shape, or `None` for a miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberMatch {
    pub contract: usize,
    pub target: Option<usize>,
}

/// The full per-member outcome of matching one contract against one
/// concrete shape. Computed once per (contract, target) pair.
#[derive(Debug, Clone)]
pub struct MatchReport {
    pub matches: Vec<MemberMatch>,
}

impl MatchReport {
    pub fn is_complete(&self) -> bool {
        self.matches.iter().all(|m| m.target.is_some())
    }

    /// Indices of contract members with no structural counterpart.
    pub fn unmatched(&self) -> impl Iterator<Item = usize> + '_ {
        self.matches
            .iter()
            .filter(|m| m.target.is_none())
            .map(|m| m.contract)
    }
}

/// Compare every contract member against the target shape's member list.
///
/// Overloads are resolved independently: each contract member is checked
/// against the full same-named set with whole-signature comparison, so
/// distinct overloads land on distinct target members.
pub fn match_members(contract: &TypeShape, target: &TypeShape) -> MatchReport {
    let matches = contract
        .members()
        .iter()
        .enumerate()
        .map(|(i, cm)| MemberMatch {
            contract: i,
            target: target
                .members()
                .iter()
                .position(|tm| compatible(&cm.desc, &tm.desc)),
        })
        .collect();
    MatchReport { matches }
}

/// One contract member vs one target member: same name, same kind, and a
/// signature the target can satisfy.
fn compatible(cm: &MemberDesc, tm: &MemberDesc) -> bool {
    if cm.name() != tm.name() {
        return false;
    }
    match (cm, tm) {
        (
            MemberDesc::Method {
                params: cp,
                ret: cr,
                ..
            },
            MemberDesc::Method {
                params: tp,
                ret: tr,
                ..
            },
        ) => {
            cr == tr
                && cp.len() == tp.len()
                && cp
                    .iter()
                    .zip(tp)
                    .all(|(c, t)| c.ty == t.ty && c.direction.class() == t.direction.class())
        }
        (
            MemberDesc::Property {
                value: cv,
                has_get: cg,
                has_set: cs,
                ..
            },
            MemberDesc::Property {
                value: tv,
                has_get: tg,
                has_set: ts,
                ..
            },
        ) => {
            // The target may expose strictly more capability, never less.
            cv == tv && (!*cg || *tg) && (!*cs || *ts)
        }
        (
            MemberDesc::Event { handler: ch, .. },
            MemberDesc::Event { handler: th, .. },
        ) => ch == th,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{ParamDesc, TypeDesc};

    struct Widget;

    fn widget_shape() -> TypeShape {
        TypeShape::concrete::<Widget>()
            .method0("Ping", |_: &Widget| ())
            .method0("Count", |_: &Widget| 0i64)
            .method1("Scale", |_: &Widget, _: i64| 0i64)
            .method1("Scale", |_: &Widget, _: f64| 0f64)
            .method1_ref("Bump", |_: &Widget, _: &mut i64| {})
            .property_get("Name", |_: &Widget| String::new())
            .finish()
    }

    // ── Methods ──────────────────────────────────────────────────

    #[test]
    fn matches_identical_method_signature() {
        let contract = TypeShape::interface("IWidget")
            .method0::<()>("Ping")
            .method0::<i64>("Count")
            .finish();
        let report = match_members(&contract, &widget_shape());
        assert!(report.is_complete());
    }

    #[test]
    fn return_type_mismatch_is_a_miss() {
        let contract = TypeShape::interface("IWidget")
            .method0::<String>("Count")
            .finish();
        let report = match_members(&contract, &widget_shape());
        assert!(!report.is_complete());
    }

    #[test]
    fn param_count_mismatch_is_a_miss() {
        let contract = TypeShape::interface("IWidget")
            .method1::<i64, ()>("Ping")
            .finish();
        let report = match_members(&contract, &widget_shape());
        assert!(!report.is_complete());
    }

    #[test]
    fn name_is_case_sensitive() {
        let contract = TypeShape::interface("IWidget").method0::<()>("ping").finish();
        let report = match_members(&contract, &widget_shape());
        assert!(!report.is_complete());
    }

    #[test]
    fn kind_must_be_identical() {
        // "Count" exists as a method on Widget, not as a property.
        let contract = TypeShape::interface("IWidget")
            .property_get::<i64>("Count")
            .finish();
        let report = match_members(&contract, &widget_shape());
        assert!(!report.is_complete());
    }

    // ── Overloads ────────────────────────────────────────────────

    #[test]
    fn overloads_resolve_to_distinct_members() {
        let contract = TypeShape::interface("IWidget")
            .method1::<i64, i64>("Scale")
            .method1::<f64, f64>("Scale")
            .finish();
        let report = match_members(&contract, &widget_shape());
        assert!(report.is_complete());
        let a = report.matches[0].target.unwrap();
        let b = report.matches[1].target.unwrap();
        assert_ne!(a, b, "each overload must land on its own target member");
    }

    // ── Parameter directions ─────────────────────────────────────

    #[test]
    fn out_matches_a_by_ref_target() {
        // by-ref and output-only are one direction class for matching.
        let contract = TypeShape::interface("IWidget")
            .method1_out::<i64>("Bump")
            .finish();
        let report = match_members(&contract, &widget_shape());
        assert!(report.is_complete());
    }

    #[test]
    fn by_value_never_matches_a_by_ref_target() {
        let contract = TypeShape::interface("IWidget")
            .method1::<i64, ()>("Bump")
            .finish();
        let report = match_members(&contract, &widget_shape());
        assert!(!report.is_complete());
    }

    // ── Properties ───────────────────────────────────────────────

    #[test]
    fn property_capability_may_exceed_but_never_undercut() {
        struct Gadget;
        let target = TypeShape::concrete::<Gadget>()
            .property("Level", |_: &Gadget| 0i64, |_: &Gadget, _: i64| {})
            .finish();

        // get-only contract against get+set target: fine.
        let contract = TypeShape::interface("IGadget")
            .property_get::<i64>("Level")
            .finish();
        assert!(match_members(&contract, &target).is_complete());

        // get+set contract against get-only target: miss.
        let target = TypeShape::concrete::<Gadget>()
            .property_get("Level", |_: &Gadget| 0i64)
            .finish();
        let contract = TypeShape::interface("IGadget")
            .property::<i64>("Level")
            .finish();
        assert!(!match_members(&contract, &target).is_complete());
    }

    #[test]
    fn property_value_type_must_be_equal() {
        let contract = TypeShape::interface("IWidget")
            .property_get::<i64>("Name")
            .finish();
        let report = match_members(&contract, &widget_shape());
        assert!(!report.is_complete());
    }

    // ── Events ───────────────────────────────────────────────────

    #[test]
    fn event_matching_is_defined_by_handler_type() {
        struct Emitter;
        let target = TypeShape::concrete::<Emitter>().finish();
        let contract = TypeShape::interface("IEmitter")
            .event::<fn(i64)>("Changed")
            .finish();
        // No same-named event on the target: a miss, not a panic.
        assert!(!match_members(&contract, &target).is_complete());
    }

    // ── Report coverage ──────────────────────────────────────────

    #[test]
    fn report_covers_every_member_and_never_short_circuits() {
        let contract = TypeShape::interface("IWidget")
            .method0::<()>("Missing1")
            .method0::<()>("Ping")
            .method0::<()>("Missing2")
            .finish();
        let report = match_members(&contract, &widget_shape());
        assert_eq!(report.matches.len(), 3);
        let unmatched: Vec<usize> = report.unmatched().collect();
        assert_eq!(unmatched, vec![0, 2]);
    }

    #[test]
    fn general_method_descriptor_participates() {
        let contract = TypeShape::interface("IWidget")
            .method(
                "Bump",
                vec![ParamDesc::by_ref::<i64>()],
                TypeDesc::of::<()>(),
            )
            .finish();
        assert!(match_members(&contract, &widget_shape()).is_complete());
    }
}
