use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::time::Instant;

use crate::candidates::CandidatePool;
use crate::config::{CancelFlag, OptimizationLevel};
use crate::data::{Section, SectionId, StudentContext};
use crate::fitness;

/// Fitness assigned to an individual with no valid gene at all; dominates
/// any real schedule so such individuals are selected against.
const INVALID_INDIVIDUAL_PENALTY: f64 = 10_000.0;

/// One gene per desired subject: the chosen section id, or `None` when the
/// subject is left unassigned in this individual.
type Individual = Vec<Option<SectionId>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaParams {
    pub population_size: usize,
    pub generations: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    pub tournament_size: usize,
}

impl GaParams {
    /// Preset parameters per optimization level. `none` is not expected
    /// here; it falls back to the medium preset like an unknown level.
    pub fn for_level(level: OptimizationLevel) -> Self {
        let (population_size, generations) = match level {
            OptimizationLevel::Low => (50, 20),
            OptimizationLevel::High => (200, 100),
            _ => (100, 50),
        };
        Self {
            population_size,
            generations,
            crossover_rate: 0.7,
            mutation_rate: 0.2,
            tournament_size: 3,
        }
    }
}

/// Result of a genetic run: the best-ever individual decoded to section
/// ids, its fitness, and the best fitness seen at each generation.
#[derive(Debug, Clone)]
pub struct GaOutcome {
    pub best: Vec<SectionId>,
    pub best_fitness: f64,
    pub history: Vec<f64>,
}

/// Population-based refinement of a feasible candidate pool against the
/// soft-constraint fitness.
///
/// Every operator keeps individuals inside the hard-constraint envelope:
/// genes only ever hold sections with open seats that do not overlap the
/// individual's other genes. The RNG is threaded explicitly so a fixed
/// seed reproduces the full run.
pub struct GeneticOptimizer<'a> {
    student: &'a StudentContext,
    pool: &'a CandidatePool,
    sections_by_id: HashMap<SectionId, &'a Section>,
    params: GaParams,
    rng: StdRng,
}

impl<'a> GeneticOptimizer<'a> {
    pub fn new(
        student: &'a StudentContext,
        pool: &'a CandidatePool,
        params: GaParams,
        seed: u64,
    ) -> Self {
        let sections_by_id = pool.filtered().iter().map(|s| (s.id, s)).collect();
        Self {
            student,
            pool,
            sections_by_id,
            params,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Runs the full generational loop and returns the best-ever
    /// individual. Stops early when `cancel` fires; the caller decides how
    /// to report the interrupted run.
    pub fn run(&mut self, cancel: &CancelFlag) -> GaOutcome {
        let start_time = Instant::now();
        let size = self.params.population_size;
        info!(
            "GA start: population {}, generations {}, {} desired subjects",
            size,
            self.params.generations,
            self.student.desired_subject_ids.len()
        );

        let mut population: Vec<Individual> =
            (0..size).map(|_| self.create_individual()).collect();
        let mut fitnesses: Vec<f64> = population.iter().map(|ind| self.evaluate(ind)).collect();

        let mut best_index = argmin(&fitnesses);
        let mut best_ever = population[best_index].clone();
        let mut best_fitness = fitnesses[best_index];
        let mut history = Vec::with_capacity(self.params.generations);

        for generation in 0..self.params.generations {
            if cancel.is_cancelled() {
                debug!("GA cancelled at generation {}", generation);
                break;
            }

            // tournament selection refills the mating pool
            let mut offspring: Vec<Individual> = (0..size)
                .map(|_| self.tournament(&population, &fitnesses).clone())
                .collect();

            // pairwise uniform crossover
            for pair in (0..size.saturating_sub(1)).step_by(2) {
                if self.rng.gen_bool(self.params.crossover_rate) {
                    let (first, second) =
                        self.crossover(&offspring[pair], &offspring[pair + 1]);
                    offspring[pair] = first;
                    offspring[pair + 1] = second;
                }
            }

            // per-individual mutation
            for i in 0..offspring.len() {
                if self.rng.gen_bool(self.params.mutation_rate) {
                    self.mutate(&mut offspring[i]);
                }
            }

            // generational replacement
            population = offspring;
            fitnesses = population.iter().map(|ind| self.evaluate(ind)).collect();

            best_index = argmin(&fitnesses);
            if fitnesses[best_index] < best_fitness {
                best_fitness = fitnesses[best_index];
                best_ever = population[best_index].clone();
            }
            history.push(best_fitness);
        }

        let best: Vec<SectionId> = best_ever.iter().flatten().copied().collect();
        info!(
            "GA finished in {:.2?}: best fitness {:.2}, {} of {} subjects assigned",
            start_time.elapsed(),
            best_fitness,
            best.len(),
            self.student.desired_subject_ids.len()
        );
        GaOutcome {
            best,
            best_fitness,
            history,
        }
    }

    /// Builds a random valid individual: for each desired subject, the
    /// candidates are tried in random order and the first one with open
    /// seats that does not overlap the already-placed genes wins.
    fn create_individual(&mut self) -> Individual {
        let mut genes: Individual = Vec::with_capacity(self.student.desired_subject_ids.len());
        for &subject_id in &self.student.desired_subject_ids {
            let mut candidates: Vec<&Section> = self.pool.filtered_for(subject_id).collect();
            candidates.shuffle(&mut self.rng);
            let pick = candidates
                .into_iter()
                .find(|s| s.available_seats() > 0 && !self.conflicts_with(s, &genes, None));
            genes.push(pick.map(|s| s.id));
        }
        genes
    }

    fn evaluate(&self, genes: &Individual) -> f64 {
        let sections: Vec<&Section> = genes
            .iter()
            .flatten()
            .filter_map(|id| self.sections_by_id.get(id).copied())
            .collect();
        if sections.is_empty() {
            return INVALID_INDIVIDUAL_PENALTY;
        }
        fitness::score(sections)
    }

    /// Tournament of `tournament_size`, sampled with replacement; the best
    /// by fitness survives.
    fn tournament<'b>(
        &mut self,
        population: &'b [Individual],
        fitnesses: &[f64],
    ) -> &'b Individual {
        let mut winner = self.rng.gen_range(0..population.len());
        for _ in 1..self.params.tournament_size {
            let challenger = self.rng.gen_range(0..population.len());
            if fitnesses[challenger] < fitnesses[winner] {
                winner = challenger;
            }
        }
        &population[winner]
    }

    /// Uniform crossover: each position independently keeps or swaps the
    /// parents' genes with equal probability.
    fn crossover(&mut self, parent1: &Individual, parent2: &Individual) -> (Individual, Individual) {
        let mut child1 = Vec::with_capacity(parent1.len());
        let mut child2 = Vec::with_capacity(parent2.len());
        for i in 0..parent1.len() {
            if self.rng.gen_bool(0.5) {
                child1.push(parent1[i]);
                child2.push(parent2[i]);
            } else {
                child1.push(parent2[i]);
                child2.push(parent1[i]);
            }
        }
        (child1, child2)
    }

    /// Re-picks one random position to a different feasibility-preserving
    /// section of the same subject. A gene that is still valid survives
    /// when no alternative fits; an invalid one is cleared.
    fn mutate(&mut self, genes: &mut Individual) {
        if genes.is_empty() {
            return;
        }
        let index = self.rng.gen_range(0..genes.len());
        let subject_id = self.student.desired_subject_ids[index];
        let current = genes[index];
        let alternatives: Vec<&Section> = self
            .pool
            .filtered_for(subject_id)
            .filter(|s| Some(s.id) != current)
            .filter(|s| s.available_seats() > 0 && !self.conflicts_with(s, genes, Some(index)))
            .collect();
        if let Some(section) = alternatives.choose(&mut self.rng) {
            genes[index] = Some(section.id);
        } else {
            let current_still_valid = current.is_some_and(|id| {
                self.sections_by_id.get(&id).is_some_and(|s| {
                    s.available_seats() > 0 && !self.conflicts_with(s, genes, Some(index))
                })
            });
            if !current_still_valid {
                genes[index] = None;
            }
        }
    }

    fn conflicts_with(
        &self,
        section: &Section,
        genes: &[Option<SectionId>],
        skip: Option<usize>,
    ) -> bool {
        genes.iter().enumerate().any(|(i, gene)| {
            if Some(i) == skip {
                return false;
            }
            gene.is_some_and(|id| {
                self.sections_by_id
                    .get(&id)
                    .is_some_and(|other| section.overlaps(other))
            })
        })
    }
}

fn argmin(fitnesses: &[f64]) -> usize {
    let mut best = 0;
    for (i, fitness) in fitnesses.iter().enumerate() {
        if *fitness < fitnesses[best] {
            best = i;
        }
    }
    best
}
