//! Shared workload definitions
//!
//! The Life transition rule and the seeded initial states live here so that
//! every backend (scalar, parallel, device) computes from the same source of
//! truth. The WGSL kernels in `device.rs` must reproduce `count_neighbors` +
//! `next_cell` bit-for-bit; the integer-only logic makes that exact.

/// SplitMix64 PRNG step - the reproducible seeding primitive.
///
/// The initial grid is generated on the host from this stream for all
/// backends, including the device backend (which uploads it), so a fixed
/// seed yields identical starting states everywhere.
#[inline]
pub fn split_mix_64(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9e3779b97f4a7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

/// Seed a Life grid: one 0/1 cell per linear index.
pub fn seed_cells(seed: u64, width: usize, height: usize) -> Vec<u32> {
    (0..width * height)
        .map(|i| (split_mix_64(seed.wrapping_add(i as u64)) & 1) as u32)
        .collect()
}

/// Seed the timer workload: one accumulator per element in [0, 360).
pub fn seed_timers(seed: u64, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| (split_mix_64(seed.wrapping_add(i as u64)) % 360_000) as f32 / 1000.0)
        .collect()
}

/// Count the live cells among the eight neighbors of (x, y).
///
/// Out-of-grid neighbors do not count; there is no wraparound. A corner cell
/// therefore sees at most three neighbors.
#[inline]
pub fn count_neighbors(cells: &[u32], x: usize, y: usize, width: usize, height: usize) -> u32 {
    let mut count = 0;
    for dy in -1i64..=1 {
        for dx in -1i64..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            if nx >= 0 && nx < width as i64 && ny >= 0 && ny < height as i64 {
                count += cells[ny as usize * width + nx as usize];
            }
        }
    }
    count
}

/// The Life transition rule for a single cell.
#[inline]
pub fn next_cell(alive: u32, neighbors: u32) -> u32 {
    if alive == 1 && (neighbors < 2 || neighbors > 3) {
        0 // under- or overpopulation
    } else if alive == 0 && neighbors == 3 {
        1 // birth
    } else {
        alive
    }
}

/// Evaluate one generation for the linear index range starting at `start`,
/// writing into `next`. `current` is the full grid and is only read.
///
/// Both host backends step through this function: the scalar engine with the
/// whole grid as one slice, the parallel engine with one disjoint slice per
/// chunk. That shared path is what makes their results bit-identical by
/// construction.
pub fn step_slice(current: &[u32], next: &mut [u32], start: usize, width: usize, height: usize) {
    for (offset, out) in next.iter_mut().enumerate() {
        let index = start + offset;
        let x = index % width;
        let y = index / width;
        let neighbors = count_neighbors(current, x, y, width, height);
        *out = next_cell(current[index], neighbors);
    }
}
