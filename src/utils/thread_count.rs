/// samtools --threads counts threads in addition to the main one, so it only
/// gets a value when more than one thread is requested
pub fn extra_threads(threads: usize) -> Option<usize> {
    if threads > 1 {
        Some(threads - 1)
    } else {
        None
    }
}
