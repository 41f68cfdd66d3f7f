use crate::event_bus::EventBus;

/// What a pass decided about the rest of the cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    Continue,
    /// Stop the cycle; remaining passes run again on the next trigger.
    Abort,
}

/// A unit of the draw cycle executed by the [`Scheduler`].
///
/// Passes run in a stable order based on their `(priority, id)`. The chart
/// relies on this for its ordering invariant: layout must resolve before
/// the map is rescaled, rescale before reconciliation, reconciliation
/// before styling.
pub struct Pass<Ctx> {
    pub id: &'static str,
    /// Smaller values run earlier.
    pub priority: i32,
    pub run: Box<dyn FnMut(&mut Ctx, &mut EventBus) -> PassOutcome>,
}

impl<Ctx> Pass<Ctx> {
    pub fn new(
        id: &'static str,
        priority: i32,
        run: impl FnMut(&mut Ctx, &mut EventBus) -> PassOutcome + 'static,
    ) -> Self {
        Self {
            id,
            priority,
            run: Box::new(run),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    pub ran_passes: usize,
    pub aborted: bool,
}

pub struct Scheduler<Ctx> {
    next_order: u64,
    passes: Vec<(u64, Pass<Ctx>)>,
}

impl<Ctx> Scheduler<Ctx> {
    pub fn new() -> Self {
        Self {
            next_order: 0,
            passes: Vec::new(),
        }
    }

    pub fn add_pass(&mut self, pass: Pass<Ctx>) {
        let order = self.next_order;
        self.next_order = self.next_order.wrapping_add(1);
        self.passes.push((order, pass));
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Runs all passes in a deterministic order against `ctx`.
    ///
    /// Total ordering: `(priority, id, insertion_order)`. This stays
    /// deterministic even if callers accidentally register duplicate pass
    /// ids. A pass returning [`PassOutcome::Abort`] stops the cycle; the
    /// skipped passes are reported in the summary.
    pub fn run_cycle(&mut self, ctx: &mut Ctx, bus: &mut EventBus) -> CycleSummary {
        self.passes.sort_by(|(oa, a), (ob, b)| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.id.cmp(b.id))
                .then_with(|| oa.cmp(ob))
        });

        let mut ran = 0usize;
        for (_order, pass) in &mut self.passes {
            ran += 1;
            if (pass.run)(ctx, bus) == PassOutcome::Abort {
                return CycleSummary {
                    ran_passes: ran,
                    aborted: true,
                };
            }
        }

        CycleSummary {
            ran_passes: ran,
            aborted: false,
        }
    }
}
