/*!

Statistics collaborator (§1/§6): "counters with `sample(value)` and
scalar increment". Grounded on `measures.rs`'s running-accumulator
style (`Statistics::track_*` fields summing into means on demand), but
without its histogram binning, Jain-index fairness index, or result-file
writing — those stay the enclosing harness's job (§1 Non-goals).

*/

use std::collections::HashMap;

/// The seam every stats consumer in this crate (SPIN's rotation
/// counters, `GarnetNetwork`'s latency tracking) is written against, so
/// an enclosing harness can supply a richer sink without this crate
/// depending on it.
pub trait StatisticsSink
{
	fn sample(&mut self, label:&str, value:f64);
	fn increment(&mut self, label:&str);
}

/// A minimal in-process sink: a running count/sum per labeled series
/// (enough to report a mean), and a plain counter per labeled event.
#[derive(Debug,Default)]
pub struct InMemorySink
{
	series: HashMap<String,(u64,f64)>,
	counters: HashMap<String,u64>,
}

impl InMemorySink
{
	pub fn new() -> InMemorySink { InMemorySink::default() }

	pub fn mean(&self, label:&str) -> Option<f64>
	{
		self.series.get(label).map(|&(n,sum)|if n==0 { 0.0 } else { sum / n as f64 })
	}

	pub fn count(&self, label:&str) -> u64
	{
		self.counters.get(label).copied().unwrap_or(0)
	}

	pub fn samples(&self, label:&str) -> u64
	{
		self.series.get(label).map(|&(n,_)|n).unwrap_or(0)
	}
}

impl StatisticsSink for InMemorySink
{
	fn sample(&mut self, label:&str, value:f64)
	{
		let entry = self.series.entry(label.to_string()).or_insert((0,0.0));
		entry.0 += 1;
		entry.1 += value;
	}

	fn increment(&mut self, label:&str)
	{
		*self.counters.entry(label.to_string()).or_insert(0) += 1;
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn mean_of_sampled_series()
	{
		let mut sink = InMemorySink::new();
		sink.sample("flit_latency",2.0);
		sink.sample("flit_latency",4.0);
		assert_eq!(sink.mean("flit_latency"),Some(3.0));
		assert_eq!(sink.samples("flit_latency"),2);
	}

	#[test]
	fn increment_counts_events()
	{
		let mut sink = InMemorySink::new();
		sink.increment("spin_rotation");
		sink.increment("spin_rotation");
		assert_eq!(sink.count("spin_rotation"),2);
	}

	#[test]
	fn missing_series_has_no_mean()
	{
		let sink = InMemorySink::new();
		assert_eq!(sink.mean("nothing_yet"),None);
	}
}
