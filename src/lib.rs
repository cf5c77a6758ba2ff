/*!
`gacha_economy`: a pure gacha economy and draw resolution engine.

What it does
- Models rarity tiers whose emission rates are exact fractions in [0,1],
  with one optional auto-adjust tier that absorbs `1 − Σ(other rates)`.
- Builds flat weighted pools (one entry per drawable item) from catalog and
  rarity snapshots.
- Resolves a point budget into pulls (`calculate_draw_plan`) and inverts the
  resolver to find the points a pull count needs.
- Executes draws with an injected uniform source, overlaying guarantee
  windows as a post-pass.
- Answers "odds over N draws" questions in closed form, RNG-free.

How to use (call surface only)
- `systems::pool::build_gacha_pools(&catalog, &rarities, None)` → pools.
- `systems::plan::calculate_draw_plan(&PlanRequest { .. })` → `DrawPlan`.
- `systems::draw::execute_gacha(&ExecuteRequest { .. }, &mut rng)` → result.
- `mechanics::odds::*` for display statistics.

What it does NOT do
- No persistence, no UI, no transport. Every call takes immutable snapshots
  and returns newly built values; nothing is retained between calls.
*/

/// Result of a bounded refinement run.
#[derive(Clone, Debug)]
pub struct Refined<P, M> {
    pub theta: P,
    pub metrics: M,
    pub iters: usize,
    pub converged: bool,
}

/// Deterministic bounded refinement: measure(simulate(θ_t)) until `converged`,
/// otherwise θ_{t+1} = update(θ_t, m_t). Returns the last θ and its metrics.
///
/// `max_iters` counts simulate calls and is clamped to at least one.
pub fn refine_det<P, D, M, Sim, Meas, Upd, Conv>(
    mut theta: P,
    mut simulate: Sim,
    mut measure: Meas,
    mut update: Upd,
    converged: Conv,
    max_iters: usize,
) -> Refined<P, M>
where
    Sim: FnMut(&P) -> D,
    Meas: FnMut(&D) -> M,
    Upd: FnMut(&P, &M) -> P,
    Conv: Fn(&P, &M) -> bool,
{
    let max_iters = max_iters.max(1);
    let mut iters = 0;
    loop {
        let data = simulate(&theta);
        let metrics = measure(&data);
        iters += 1;
        if converged(&theta, &metrics) {
            return Refined { theta, metrics, iters, converged: true };
        }
        if iters >= max_iters {
            return Refined { theta, metrics, iters, converged: false };
        }
        theta = update(&theta, &metrics);
    }
}

pub mod config;
pub mod error;
pub mod mechanics;
pub mod systems;

pub use config::EngineConfig;
pub use error::{DrawError, DrawWarning, PlanError, PlanWarning, RateError};
