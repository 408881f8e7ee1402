//! Transitive-closure policy.
//!
//! Decides, per dependency type, whether a change keeps propagating past a
//! dependant and under which restriction. Once a `datatype` or `reference`
//! hop has been taken, only `instance-of` chains are followed further, so
//! a datatype change does not drag in every structural dependant of its
//! users.

use crate::domain::DependencyType;

/// Whether an edge reached under `instance_of_only` belongs in the result.
#[must_use]
pub fn records(dep_type: DependencyType, instance_of_only: bool) -> bool {
    !instance_of_only || dep_type == DependencyType::InstanceOf
}

/// Whether to keep expanding from the source of an edge of `dep_type`.
///
/// Returns `None` to stop, or `Some(flag)` to continue with `flag` as the
/// `instance_of_only` restriction for the next hop. `aggregate_roots` is
/// the builder set's answer for composition targets.
#[must_use]
pub fn propagation(
    dep_type: DependencyType,
    instance_of_only: bool,
    aggregate_roots: bool,
) -> Option<bool> {
    if instance_of_only {
        return (dep_type == DependencyType::InstanceOf).then_some(true);
    }
    match dep_type {
        DependencyType::Subtype | DependencyType::InstanceOf => Some(false),
        DependencyType::ReferenceCompositionMasterDetail => aggregate_roots.then_some(false),
        DependencyType::Reference | DependencyType::Datatype => Some(true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::subtype(DependencyType::Subtype, false, false, Some(false))]
    #[case::instance_of(DependencyType::InstanceOf, false, false, Some(false))]
    #[case::reference(DependencyType::Reference, false, false, Some(true))]
    #[case::datatype(DependencyType::Datatype, false, false, Some(true))]
    #[case::composition_plain(DependencyType::ReferenceCompositionMasterDetail, false, false, None)]
    #[case::composition_aggregate(
        DependencyType::ReferenceCompositionMasterDetail,
        false,
        true,
        Some(false)
    )]
    #[case::restricted_instance_of(DependencyType::InstanceOf, true, false, Some(true))]
    #[case::restricted_subtype(DependencyType::Subtype, true, false, None)]
    #[case::restricted_reference(DependencyType::Reference, true, false, None)]
    #[case::restricted_datatype(DependencyType::Datatype, true, false, None)]
    #[case::restricted_composition(
        DependencyType::ReferenceCompositionMasterDetail,
        true,
        true,
        None
    )]
    fn propagation_table(
        #[case] dep_type: DependencyType,
        #[case] instance_of_only: bool,
        #[case] aggregate_roots: bool,
        #[case] expected: Option<bool>,
    ) {
        assert_eq!(
            propagation(dep_type, instance_of_only, aggregate_roots),
            expected
        );
    }

    #[rstest]
    fn unrestricted_expansion_records_everything(
        #[values(
            DependencyType::InstanceOf,
            DependencyType::Subtype,
            DependencyType::Reference,
            DependencyType::Datatype,
            DependencyType::ReferenceCompositionMasterDetail
        )]
        dep_type: DependencyType,
    ) {
        assert!(records(dep_type, false));
        assert_eq!(records(dep_type, true), dep_type == DependencyType::InstanceOf);
    }

    #[test]
    fn restriction_never_loosens() {
        for dep_type in DependencyType::ALL {
            for aggregate_roots in [false, true] {
                if let Some(child) = propagation(dep_type, true, aggregate_roots) {
                    assert!(child, "{dep_type} loosened a restricted expansion");
                }
            }
        }
    }
}
