use ffneat::genomics::NodeRole;
use ffneat::logging::{EvolutionLogger, GenerationMemberRecord, ReportingLevel};
use ffneat::populations::SpeciesID;
use ffneat::{crossover, GeneticConfig, Genome, Population, PopulationConfig, StructuralMutator};

use std::collections::HashSet;
use std::num::NonZeroUsize;

fn weight_sum_fitness(genome: &Genome) -> f32 {
    -genome.connections().map(|c| c.weight()).sum::<f32>().abs()
}

fn small_population() -> Population {
    Population::new(
        PopulationConfig {
            size: NonZeroUsize::new(10).unwrap(),
            ..PopulationConfig::default()
        },
        GeneticConfig {
            input_count: NonZeroUsize::new(3).unwrap(),
            output_count: NonZeroUsize::new(1).unwrap(),
            initial_hidden_nodes: 2,
            ..GeneticConfig::default()
        },
    )
}

fn assert_structurally_valid(genome: &Genome, offspring: bool) {
    assert!(genome.is_acyclic(), "cycle in {}", genome);
    let mut pairs = HashSet::new();
    for connection in genome.connections() {
        let (source, target) = connection.endpoints();
        assert!(genome.node(source).is_some());
        assert!(genome.node(target).is_some());
        assert!(pairs.insert((source.min(target), source.max(target))));
    }
    for node in genome.nodes() {
        if offspring && node.role() == NodeRole::Hidden {
            assert!(genome.connections().any(|c| c.target() == node.id()));
            assert!(genome.connections().any(|c| c.source() == node.id()));
        }
    }
}

#[test]
fn size_is_stable_and_champion_never_regresses() {
    let mut population = small_population();
    let mutator = StructuralMutator::default();
    let mut previous_champion = f32::NEG_INFINITY;
    for _ in 0..30 {
        population.evaluate_fitness(weight_sum_fitness);
        let champion = population.champion().and_then(|g| g.fitness()).unwrap();
        assert!(
            champion >= previous_champion,
            "champion fell from {} to {}",
            previous_champion,
            champion
        );
        previous_champion = champion;

        population.evolve(&crossover, &mutator).unwrap();
        assert_eq!(population.genomes().count(), 10);
    }
    assert_eq!(population.generation(), 30);
}

#[test]
fn offspring_stay_structurally_valid() {
    let mut population = small_population();
    let mutator = StructuralMutator::default();
    for _ in 0..20 {
        population.evaluate_fitness(weight_sum_fitness);
        population.evolve(&crossover, &mutator).unwrap();
        for genome in population.genomes() {
            // Survivors are carried over verbatim, offspring went through the mutator.
            assert_structurally_valid(genome, genome.fitness().is_none());
            assert_eq!(genome.input_count(), 3);
            assert_eq!(genome.output_count(), 1);
        }
    }
}

#[test]
fn genome_ids_are_never_reused() {
    let mut population = small_population();
    let mutator = StructuralMutator::default();
    let mut seen = HashSet::new();
    for _ in 0..5 {
        let current: HashSet<usize> = population.genomes().map(|g| g.id()).collect();
        assert_eq!(current.len(), 10);
        population.evaluate_fitness(weight_sum_fitness);
        population.evolve(&crossover, &mutator).unwrap();
        seen.extend(current);
    }
    let fresh = population
        .genomes()
        .filter(|g| g.fitness().is_none())
        .map(|g| g.id());
    for id in fresh {
        assert!(!seen.contains(&id));
    }
}

#[test]
fn custom_strategies_drive_evolution() {
    let mut population = small_population();
    let default_crossover = |a: &Genome, b: &Genome, registry: &mut ffneat::IdentityRegistry| {
        crossover(a, b, registry)
    };
    let only_weights = |g: &mut Genome, _: &mut ffneat::IdentityRegistry, rate: f32| {
        g.mutate_weights(rate, 0.5);
    };
    for _ in 0..3 {
        population.evaluate_fitness(weight_sum_fitness);
        population.evolve(&default_crossover, &only_weights).unwrap();
    }
    assert_eq!(population.genomes().count(), 10);
}

#[test]
fn species_ids_are_stamped_with_their_generation() {
    let mut population = small_population();
    let mutator = StructuralMutator::default();
    for generation in 0..4 {
        population.evaluate_fitness(weight_sum_fitness);
        population.evolve(&crossover, &mutator).unwrap();
        for species in population.species() {
            let SpeciesID(born, _) = species.id();
            assert!(born <= generation);
        }
    }
}

#[test]
fn logger_records_each_generation() {
    let mut population = small_population();
    let mutator = StructuralMutator::default();
    let mut logger = EvolutionLogger::new(ReportingLevel::SpeciesChampions);
    for _ in 0..3 {
        population.evaluate_fitness(weight_sum_fitness);
        population.evolve(&crossover, &mutator).unwrap();
        logger.log(
            &population,
            &|g| [g.nodes().count() as f32, g.connections().count() as f32],
            ["nodes", "connections"],
        );
    }
    let logs: Vec<_> = logger.iter().collect();
    assert_eq!(logs.len(), 3);
    for (i, log) in logs.iter().enumerate() {
        assert_eq!(log.generation_number, i + 1);
        assert_eq!(log.genome_stats.len(), 2);
        assert!(log.genome_stats[0].1.minimum >= 4.0);
        match &log.generation_sample {
            GenerationMemberRecord::SpeciesChampions(champions) => {
                assert_eq!(champions.len(), log.species_count)
            }
            other => panic!("unexpected record {:?}", other),
        }
    }
}

#[test]
fn population_survives_serialization() {
    let mut population = small_population();
    let mutator = StructuralMutator::default();
    population.evaluate_fitness(weight_sum_fitness);
    population.evolve(&crossover, &mutator).unwrap();

    let serialized = ron::to_string(&population).unwrap();
    let mut restored: Population = ron::from_str(&serialized).unwrap();
    assert_eq!(restored.generation(), 1);
    assert_eq!(restored.registry(), population.registry());

    restored.evaluate_fitness(weight_sum_fitness);
    restored.evolve(&crossover, &mutator).unwrap();
    assert_eq!(restored.genomes().count(), 10);
}

#[test]
fn champion_json_round_trip() {
    let mut population = small_population();
    population.evaluate_fitness(weight_sum_fitness);
    let champion = population.champion().unwrap();
    let json = serde_json::to_string(champion).unwrap();
    let restored: Genome = serde_json::from_str(&json).unwrap();
    assert_eq!(&restored, champion);
    assert_eq!(
        restored.activate(&[0.5, -0.5, 1.0]).unwrap(),
        champion.activate(&[0.5, -0.5, 1.0]).unwrap()
    );
}
