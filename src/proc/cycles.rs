use log::warn;

//===========================================================================//

/// The composition layer a cycle remark belongs to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Layer {
    /// The remark depends on how the operand was addressed.
    AddressingMode,
    /// The remark depends on what the instruction does.
    Operator,
}

/// Facts about one execution of an instruction that cycle remarks depend
/// on.  Width and mode flags are captured before the operator runs.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Conditions {
    /// The accumulator was 16 bits wide (m = 0).
    pub wide_accumulator: bool,
    /// The index registers were 16 bits wide (x = 0).
    pub wide_index: bool,
    /// The processor was in native mode (e = 0).
    pub native: bool,
    /// The low byte of the direct page register was nonzero.
    pub direct_page_unaligned: bool,
    /// Indexing carried into a different page.
    pub index_page_crossed: bool,
    /// A branch condition held.
    pub branch_taken: bool,
    /// A taken branch landed in a different page.
    pub branch_page_crossed: bool,
}

//===========================================================================//

/// A named, conditional adjustment to an instruction's base cycle count.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CycleRemark {
    /// One more cycle with a 16-bit accumulator.
    WideAccumulator,
    /// One more cycle when the direct page is not page-aligned.
    DirectPageUnaligned,
    /// One more cycle with 16-bit index registers or when indexing crosses
    /// a page.
    IndexPageCross,
    /// Two more cycles for a read-modify-write of a 16-bit value.
    WideAccumulatorRmw,
    /// One more cycle when a branch is taken.
    BranchTaken,
    /// One more cycle when a taken branch crosses a page in emulation mode.
    BranchPageCrossEmulation,
    /// One more cycle in native mode.
    NativeMode,
    /// One more cycle with 16-bit index registers.
    WideIndex,
    /// Two fewer cycles when a read-modify-write targets the accumulator,
    /// which needs no memory round trip.
    AccumulatorRmw,
    /// Two more cycles when a coprocessor branch is taken.
    BranchTakenTwice,
}

impl CycleRemark {
    /// Returns the remark's number in the published timing notes.
    pub fn id(self) -> u8 {
        match self {
            CycleRemark::WideAccumulator => 1,
            CycleRemark::DirectPageUnaligned => 2,
            CycleRemark::IndexPageCross => 3,
            CycleRemark::WideAccumulatorRmw => 5,
            CycleRemark::BranchTaken => 7,
            CycleRemark::BranchPageCrossEmulation => 8,
            CycleRemark::NativeMode => 9,
            CycleRemark::WideIndex => 10,
            CycleRemark::AccumulatorRmw => 21,
            CycleRemark::BranchTakenTwice => 30,
        }
    }

    /// Returns the layer this remark is attributed to.
    pub fn layer(self) -> Layer {
        match self {
            CycleRemark::DirectPageUnaligned
            | CycleRemark::IndexPageCross
            | CycleRemark::AccumulatorRmw => Layer::AddressingMode,
            CycleRemark::WideAccumulator
            | CycleRemark::WideAccumulatorRmw
            | CycleRemark::BranchTaken
            | CycleRemark::BranchPageCrossEmulation
            | CycleRemark::NativeMode
            | CycleRemark::WideIndex
            | CycleRemark::BranchTakenTwice => Layer::Operator,
        }
    }

    /// Returns how many cycles this remark adds (or removes) under the
    /// given conditions.
    pub fn extra(self, conditions: &Conditions) -> i32 {
        let when = |condition: bool, cycles: i32| {
            if condition { cycles } else { 0 }
        };
        match self {
            CycleRemark::WideAccumulator => {
                when(conditions.wide_accumulator, 1)
            }
            CycleRemark::DirectPageUnaligned => {
                when(conditions.direct_page_unaligned, 1)
            }
            CycleRemark::IndexPageCross => when(
                conditions.wide_index || conditions.index_page_crossed,
                1,
            ),
            CycleRemark::WideAccumulatorRmw => {
                when(conditions.wide_accumulator, 2)
            }
            CycleRemark::BranchTaken => when(conditions.branch_taken, 1),
            CycleRemark::BranchPageCrossEmulation => when(
                conditions.branch_taken
                    && conditions.branch_page_crossed
                    && !conditions.native,
                1,
            ),
            CycleRemark::NativeMode => when(conditions.native, 1),
            CycleRemark::WideIndex => when(conditions.wide_index, 1),
            CycleRemark::AccumulatorRmw => {
                when(conditions.wide_accumulator, -2)
            }
            CycleRemark::BranchTakenTwice => when(conditions.branch_taken, 2),
        }
    }
}

//===========================================================================//

/// Merges the remarks declared by an addressing mode and by an operator.
/// A remark declared by a layer it does not belong to is dropped, as is a
/// second copy of a remark, so each one is counted exactly once.
pub fn combine_remarks(
    mode: &[CycleRemark],
    operator: &[CycleRemark],
) -> Vec<CycleRemark> {
    let declared = mode
        .iter()
        .map(|&remark| (remark, Layer::AddressingMode))
        .chain(operator.iter().map(|&remark| (remark, Layer::Operator)));
    let mut remarks = Vec::new();
    for (remark, layer) in declared {
        if remark.layer() != layer {
            warn!("remark {} declared by the wrong layer", remark.id());
        } else if remarks.contains(&remark) {
            warn!("remark {} declared twice", remark.id());
        } else {
            remarks.push(remark);
        }
    }
    remarks
}

/// Returns `base` adjusted by every remark under the given conditions.
pub fn total_cycles(
    base: u8,
    remarks: &[CycleRemark],
    conditions: &Conditions,
) -> u32 {
    let extra: i32 =
        remarks.iter().map(|remark| remark.extra(conditions)).sum();
    (i32::from(base) + extra).max(0) as u32
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{Conditions, CycleRemark, combine_remarks, total_cycles};

    #[test]
    fn accumulator_rmw_cancels() {
        let remarks = combine_remarks(
            &[CycleRemark::AccumulatorRmw],
            &[CycleRemark::WideAccumulatorRmw],
        );
        let wide =
            Conditions { wide_accumulator: true, ..Conditions::default() };
        assert_eq!(total_cycles(2, &remarks, &wide), 2);
        assert_eq!(total_cycles(2, &remarks, &Conditions::default()), 2);
    }

    #[test]
    fn misattributed_and_duplicate_remarks_are_dropped() {
        let remarks = combine_remarks(
            &[CycleRemark::DirectPageUnaligned, CycleRemark::BranchTaken],
            &[CycleRemark::WideAccumulator, CycleRemark::WideAccumulator],
        );
        assert_eq!(
            remarks,
            vec![
                CycleRemark::DirectPageUnaligned,
                CycleRemark::WideAccumulator,
            ]
        );
    }

    #[test]
    fn branch_remarks() {
        let remarks =
            [CycleRemark::BranchTaken, CycleRemark::BranchPageCrossEmulation];
        let mut conditions = Conditions::default();
        assert_eq!(total_cycles(2, &remarks, &conditions), 2);
        conditions.branch_taken = true;
        assert_eq!(total_cycles(2, &remarks, &conditions), 3);
        conditions.branch_page_crossed = true;
        assert_eq!(total_cycles(2, &remarks, &conditions), 4);
        conditions.native = true;
        assert_eq!(total_cycles(2, &remarks, &conditions), 3);
    }

    #[test]
    fn index_page_cross() {
        let remarks = [CycleRemark::IndexPageCross];
        let mut conditions = Conditions::default();
        assert_eq!(total_cycles(4, &remarks, &conditions), 4);
        conditions.index_page_crossed = true;
        assert_eq!(total_cycles(4, &remarks, &conditions), 5);
        conditions = Conditions { wide_index: true, ..Conditions::default() };
        assert_eq!(total_cycles(4, &remarks, &conditions), 5);
    }
}

//===========================================================================//
