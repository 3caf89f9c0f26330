use ffneat::logging::{EvolutionLogger, ReportingLevel, Stats};
use ffneat::{
    crossover, GeneticConfig, Genome, MutationConfig, Population, PopulationConfig,
    StructuralMutator,
};

use std::num::NonZeroUsize;

use rayon::prelude::*;
use tracing::{info, warn};

const ERROR_MARGIN: f32 = 0.3;
const SOLVED: f32 = 16.0;
const MAX_GENERATIONS: usize = 100;

fn evaluate_xor(genome: &Genome) -> f32 {
    let values = [
        ([0.0, 0.0], 0.0),
        ([0.0, 1.0], 1.0),
        ([1.0, 0.0], 1.0),
        ([1.0, 1.0], 0.0),
    ];

    let mut errors = [0.0, 0.0, 0.0, 0.0];
    for (i, (input, output)) in values.iter().enumerate() {
        errors[i] = match genome.activate(input) {
            Ok(result) => (result[0] - output).abs().min(1.0),
            Err(_) => 1.0,
        };
        if errors[i] < ERROR_MARGIN {
            errors[i] = 0.0;
        }
    }

    (4.0 - errors.iter().copied().sum::<f32>()).powf(2.0)
}

fn solved(population: &Population) -> bool {
    (population.best_fitness() - SOLVED).abs() < f32::EPSILON
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let genetic_config = GeneticConfig {
        input_count: NonZeroUsize::new(2).unwrap(),
        output_count: NonZeroUsize::new(1).unwrap(),
        initial_hidden_nodes: 2,
        excess_gene_factor: 1.0,
        disjoint_gene_factor: 1.0,
        weight_difference_factor: 0.4,
    };
    let population_config = PopulationConfig {
        size: NonZeroUsize::new(150).unwrap(),
        distance_threshold: 3.0,
        elitism: 2,
        stagnation_threshold: NonZeroUsize::new(15).unwrap(),
        mutation_rate: 0.3,
        bias_mutation_rate: 0.3,
        bias_mutation_power: 0.3,
    };
    let mutator = StructuralMutator::new(MutationConfig {
        weight_mutation_chance: 0.8,
        weight_mutation_power: 0.5,
        node_addition_chance: 0.05,
        connection_addition_chance: 0.1,
        node_elimination_chance: 0.005,
        connection_elimination_chance: 0.01,
        ..MutationConfig::default()
    });

    match std::env::args().nth(1).as_deref() {
        Some("stress") => stress_test(&genetic_config, &population_config, &mutator),
        Some("serde") => serde_test(&genetic_config, &population_config, &mutator),
        _ => single_run(&genetic_config, &population_config, &mutator),
    }
}

fn single_run(
    genetic_config: &GeneticConfig,
    population_config: &PopulationConfig,
    mutator: &StructuralMutator,
) {
    let mut logger = EvolutionLogger::new(ReportingLevel::PopulationChampion);
    let mut population = Population::new(population_config.clone(), genetic_config.clone());
    for _ in 0..MAX_GENERATIONS {
        population.evaluate_fitness_parallel(evaluate_xor);
        logger.log(
            &population,
            &|g| {
                [
                    g.fitness().unwrap_or(0.0),
                    g.hidden_count() as f32,
                    g.connections().count() as f32,
                ]
            },
            ["fitness", "hidden nodes", "connections"],
        );
        if solved(&population) {
            break;
        }
        if let Err(e) = population.evolve(&crossover, mutator) {
            warn!("{}", e);
            break;
        }
    }
    if let Some(log) = logger.iter().last() {
        println!("{}", log);
    }
    if let Some(champion) = population.best_genome() {
        println!("{}", champion);
    }
}

fn stress_test(
    genetic_config: &GeneticConfig,
    population_config: &PopulationConfig,
    mutator: &StructuralMutator,
) {
    const ITERATIONS: usize = 200;
    let generations: Vec<Option<usize>> = (0..ITERATIONS)
        .into_par_iter()
        .map(|_| {
            let mut population =
                Population::new(population_config.clone(), genetic_config.clone());
            for _ in 0..MAX_GENERATIONS {
                population.evaluate_fitness(evaluate_xor);
                if solved(&population) {
                    return Some(population.generation());
                }
                if population.evolve(&crossover, mutator).is_err() {
                    break;
                }
            }
            None
        })
        .collect();

    info!(
        "Successful run generation count {:?}, {}% failure rate over {} iterations",
        Stats::from(generations.iter().filter_map(|g| g.map(|g| g as f32))),
        generations.iter().filter(|g| g.is_none()).count() as f32 * 100.0 / ITERATIONS as f32,
        ITERATIONS
    );
}

fn serde_test(
    genetic_config: &GeneticConfig,
    population_config: &PopulationConfig,
    mutator: &StructuralMutator,
) {
    let mut population = Population::new(population_config.clone(), genetic_config.clone());
    for _ in 0..MAX_GENERATIONS / 2 {
        population.evaluate_fitness_parallel(evaluate_xor);
        if let Err(e) = population.evolve(&crossover, mutator) {
            warn!("{}", e);
            return;
        }
    }

    let serialized = match ron::to_string(&population) {
        Ok(s) => s,
        Err(e) => {
            warn!("could not serialize population: {}", e);
            return;
        }
    };
    let mut population: Population = match ron::from_str(&serialized) {
        Ok(p) => p,
        Err(e) => {
            warn!("could not deserialize population: {}", e);
            return;
        }
    };

    for _ in 0..MAX_GENERATIONS / 2 {
        population.evaluate_fitness_parallel(evaluate_xor);
        if solved(&population) {
            break;
        }
        if let Err(e) = population.evolve(&crossover, mutator) {
            warn!("{}", e);
            break;
        }
    }
    if let Some(champion) = population.best_genome() {
        match ron::to_string(champion) {
            Ok(s) => println!("{}", s),
            Err(e) => warn!("could not serialize champion: {}", e),
        }
    }
}
