use crate::numeric::bitop::Msb;

/// Number of worker threads a prover uses when none is configured.
///
/// With the `multithreading` feature this is the machine's parallelism, rounded
/// down to a power of two so the reducer stripes and fft blocks divide evenly.
/// Without it the prover runs on a single worker.
pub fn compute_num_threads() -> usize {
    #[cfg(feature = "multithreading")]
    let num_threads: usize = num_cpus::get().max(1);
    #[cfg(not(feature = "multithreading"))]
    let num_threads: usize = 1;

    // ensure that num_threads is a power of two
    1 << num_threads.get_msb()
}
