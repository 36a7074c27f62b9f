use core::mem;

use num::Num;

/// LSD radix sort of feature indices, carrying values along (struct-of-arrays).
/// - Sorts `inds` ascending
/// - Reorders `vals` the same way
/// - Stable: equal indices keep their input order
///
/// 4 passes over the bytes of the key, each O(n + 256).
pub fn radix_sort_by_index<N: Copy + Num>(inds: &mut [u32], vals: &mut [N]) {
    debug_assert_eq!(inds.len(), vals.len());
    let n = inds.len();
    if n <= 1 {
        return;
    }

    // small rows are the common case for a single document
    if n <= 32 {
        insertion_sort_by_index(inds, vals);
        return;
    }

    let mut inds_tmp = vec![0u32; n];
    let mut vals_tmp = vec![N::zero(); n];

    let mut src_inds: &mut [u32] = inds;
    let mut src_vals: &mut [N] = vals;
    let mut dst_inds: &mut [u32] = &mut inds_tmp;
    let mut dst_vals: &mut [N] = &mut vals_tmp;

    for shift in [0u32, 8, 16, 24] {
        let mut offsets = [0usize; 256];
        for &k in src_inds.iter() {
            offsets[((k >> shift) & 0xFF) as usize] += 1;
        }

        let mut sum = 0usize;
        for c in offsets.iter_mut() {
            let tmp = *c;
            *c = sum;
            sum += tmp;
        }

        for i in 0..n {
            let k = src_inds[i];
            let bucket = ((k >> shift) & 0xFF) as usize;
            let pos = offsets[bucket];
            offsets[bucket] = pos + 1;
            dst_inds[pos] = k;
            dst_vals[pos] = src_vals[i];
        }

        mem::swap(&mut src_inds, &mut dst_inds);
        mem::swap(&mut src_vals, &mut dst_vals);
    }
    // even number of passes: the sorted data is back in the caller's slices
}

fn insertion_sort_by_index<N: Copy>(inds: &mut [u32], vals: &mut [N]) {
    for i in 1..inds.len() {
        let mut j = i;
        while j > 0 && inds[j] < inds[j - 1] {
            inds.swap(j, j - 1);
            vals.swap(j, j - 1);
            j -= 1;
        }
    }
}

/// Sort by index, then sum values sharing an index and drop the zeros that result.
/// Hash features with opposite signs may cancel out, so zero entries are never kept.
pub fn sort_and_coalesce<N: Copy + Num>(inds: &mut Vec<u32>, vals: &mut Vec<N>) {
    radix_sort_by_index(inds, vals);

    let mut write = 0usize;
    let mut read = 0usize;
    while read < inds.len() {
        let key = inds[read];
        let mut acc = vals[read];
        read += 1;
        while read < inds.len() && inds[read] == key {
            acc = acc + vals[read];
            read += 1;
        }
        if acc != N::zero() {
            inds[write] = key;
            vals[write] = acc;
            write += 1;
        }
    }
    inds.truncate(write);
    vals.truncate(write);
}
