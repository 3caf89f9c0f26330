use super::{Population, SpeciesID};
use crate::genomics::Genome;

use serde::{Deserialize, Serialize};

use std::fmt;

/// Defines different possible reporting levels for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportingLevel {
    /// Clones the entire population.
    AllGenomes,
    /// Clones species champions.
    SpeciesChampions,
    /// Clones only the population champion.
    PopulationChampion,
    /// Clones no genomes.
    NoGenomes,
}

/// A snapshot of a population.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Log {
    pub generation_number: usize,
    pub generation_sample: GenerationMemberRecord,
    pub species_count: usize,
    pub genome_stats: Vec<(String, Stats)>,
}

impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Log {{")?;
        writeln!(f, "\tgeneration_number: {}", self.generation_number)?;
        writeln!(f, "\tspecies_count: {}", self.species_count)?;
        for (name, stats) in &self.genome_stats {
            writeln!(f, "\t{}: {:?}", name, stats)?;
        }
        write!(f, "}}")
    }
}

/// A struct for reporting basic statistical data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub maximum: f32,
    pub minimum: f32,
    pub mean: f32,
    pub median: f32,
}

impl Stats {
    /// Returns statistics about numbers in a sequence.
    /// An empty sequence yields all-zero statistics.
    ///
    /// # Examples
    /// ```
    /// use ffneat::logging::Stats;
    ///
    /// let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied());
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    ///
    /// let stats = Stats::from([4.0, 1.0, 3.0, 2.0].iter().copied());
    /// assert_eq!(stats.median, 2.5);
    /// ```
    pub fn from(data: impl Iterator<Item = f32>) -> Stats {
        let mut data: Vec<f32> = data.collect();
        if data.is_empty() {
            return Stats {
                maximum: 0.0,
                minimum: 0.0,
                mean: 0.0,
                median: 0.0,
            };
        }
        data.sort_unstable_by(|a, b| a.total_cmp(b));
        let mid = data.len() / 2;
        let median = if data.len() % 2 == 0 {
            (data[mid - 1] + data[mid]) / 2.0
        } else {
            data[mid]
        };
        Stats {
            maximum: data[data.len() - 1],
            minimum: data[0],
            mean: data.iter().sum::<f32>() / data.len() as f32,
            median,
        }
    }
}

/// A reporting-level dependant store
/// of genomes from a population.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum GenerationMemberRecord {
    /// Every genome in the population.
    AllGenomes(Vec<Genome>),
    /// Species IDs, species representatives, and stagnation level.
    SpeciesChampions(Vec<(SpeciesID, Genome, usize)>),
    /// Only population champion.
    PopulationChampion(Genome),
    /// Empty.
    None,
}

/// A log of the evolution of a population over time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvolutionLogger {
    reporting_level: ReportingLevel,
    logs: Vec<Log>,
}

impl EvolutionLogger {
    /// Returns a logger with the appropiate reporting level.
    ///
    /// # Examples
    /// ```
    /// use ffneat::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// let logger = EvolutionLogger::new(ReportingLevel::NoGenomes);
    /// assert_eq!(logger.iter().count(), 0);
    /// ```
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger {
        EvolutionLogger {
            reporting_level,
            logs: vec![],
        }
    }

    /// Store a snapshot of a population.
    ///
    /// The `genome_stat_extractor` provides a way of
    /// obtaining arbitrary statistics on the population,
    /// where each statistic is named by `stat_names`.
    ///
    /// # Examples
    /// ```
    /// use ffneat::{GeneticConfig, Population, PopulationConfig};
    /// use ffneat::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// let mut logger = EvolutionLogger::new(ReportingLevel::PopulationChampion);
    /// let mut population = Population::new(PopulationConfig::zero(), GeneticConfig::zero());
    /// population.evaluate_fitness(|_| 1.0);
    ///
    /// logger.log(
    ///     &population,
    ///     &|g| [g.fitness().unwrap_or(0.0), g.connections().count() as f32],
    ///     ["fitness", "connections"],
    /// );
    ///
    /// let log = logger.iter().next().unwrap();
    /// assert_eq!(log.genome_stats[0].1.maximum, 1.0);
    /// ```
    pub fn log<GSE, const N: usize>(
        &mut self,
        population: &Population,
        genome_stat_extractor: &GSE,
        stat_names: [&str; N],
    ) where
        GSE: Fn(&Genome) -> [f32; N],
    {
        let stats: Vec<[f32; N]> = population.genomes().map(genome_stat_extractor).collect();
        let genome_stats = stat_names
            .iter()
            .copied()
            .map(String::from)
            .zip(unzip_n_vecs(stats.into_iter()))
            .map(|(name, data)| (name, Stats::from(data.into_iter())))
            .collect();
        let generation = population.generation();
        self.logs.push(Log {
            generation_number: generation,
            generation_sample: match self.reporting_level {
                ReportingLevel::AllGenomes => {
                    GenerationMemberRecord::AllGenomes(population.genomes().cloned().collect())
                }
                ReportingLevel::SpeciesChampions => GenerationMemberRecord::SpeciesChampions(
                    population
                        .species()
                        .map(|s| {
                            (
                                s.id(),
                                s.representative().clone(),
                                s.time_stagnated(generation),
                            )
                        })
                        .collect(),
                ),
                ReportingLevel::PopulationChampion => match population.champion() {
                    Some(champion) => GenerationMemberRecord::PopulationChampion(champion.clone()),
                    None => GenerationMemberRecord::None,
                },
                ReportingLevel::NoGenomes => GenerationMemberRecord::None,
            },
            species_count: population.species().count(),
            genome_stats,
        })
    }

    /// Iterate over all logged snapshots.
    ///
    /// # Examples
    /// ```
    /// use ffneat::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// let logger = EvolutionLogger::new(ReportingLevel::AllGenomes);
    /// // Log some stuff... then
    /// for log in logger.iter() {
    ///     println!("{}", log);
    /// }
    /// ```
    pub fn iter(&self) -> impl Iterator<Item = &Log> {
        self.logs.iter()
    }
}

fn unzip_n_vecs<T: Clone, const N: usize>(iter: impl Iterator<Item = [T; N]>) -> Vec<Vec<T>> {
    let mut vecs = vec![Vec::default(); N];
    for items in iter {
        for (vec, item) in vecs.iter_mut().zip(items) {
            vec.push(item);
        }
    }
    vecs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GeneticConfig, PopulationConfig};
    use std::num::NonZeroUsize;

    fn population() -> Population {
        let mut population = Population::new(
            PopulationConfig {
                size: NonZeroUsize::new(6).unwrap(),
                distance_threshold: 3.0,
                ..PopulationConfig::zero()
            },
            GeneticConfig::default(),
        );
        let mut fitness = 0.0;
        population.evaluate_fitness(|_| {
            fitness += 1.0;
            fitness
        });
        population
    }

    #[test]
    fn unzip_transposes() {
        let vecs = unzip_n_vecs([[1, 2], [3, 4], [5, 6]].into_iter());
        assert_eq!(vecs, vec![vec![1, 3, 5], vec![2, 4, 6]]);
    }

    #[test]
    fn empty_stats_are_zero() {
        let stats = Stats::from(std::iter::empty());
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.median, 0.0);
    }

    #[test]
    fn reporting_levels() {
        let population = population();
        let extractor = |g: &Genome| [g.fitness().unwrap_or(0.0)];

        let mut logger = EvolutionLogger::new(ReportingLevel::AllGenomes);
        logger.log(&population, &extractor, ["fitness"]);
        match &logger.iter().next().unwrap().generation_sample {
            GenerationMemberRecord::AllGenomes(genomes) => assert_eq!(genomes.len(), 6),
            other => panic!("unexpected record {:?}", other),
        }

        let mut logger = EvolutionLogger::new(ReportingLevel::PopulationChampion);
        logger.log(&population, &extractor, ["fitness"]);
        let log = logger.iter().next().unwrap();
        match &log.generation_sample {
            GenerationMemberRecord::PopulationChampion(g) => assert_eq!(g.fitness(), Some(6.0)),
            other => panic!("unexpected record {:?}", other),
        }
        assert_eq!(log.genome_stats[0].1.mean, 3.5);
        assert_eq!(log.genome_stats[0].1.median, 3.5);

        let mut logger = EvolutionLogger::new(ReportingLevel::NoGenomes);
        logger.log(&population, &extractor, ["fitness"]);
        assert!(matches!(
            logger.iter().next().unwrap().generation_sample,
            GenerationMemberRecord::None
        ));
    }
}
