use crate::ecc::curves::SCALAR_BITS;

/// Window width in bits for a bucket msm over `num_points` bases.
pub(crate) const fn get_optimal_bucket_width(num_points: usize) -> usize {
    if num_points >= 14617149 {
        return 21;
    }
    if num_points >= 1139094 {
        return 18;
    }
    if num_points >= 155975 {
        return 15;
    }
    if num_points >= 144834 {
        return 14;
    }
    if num_points >= 25067 {
        return 12;
    }
    if num_points >= 13926 {
        return 11;
    }
    if num_points >= 7659 {
        return 10;
    }
    if num_points >= 2436 {
        return 9;
    }
    if num_points >= 376 {
        return 7;
    }
    if num_points >= 231 {
        return 6;
    }
    if num_points >= 97 {
        return 5;
    }
    if num_points >= 35 {
        return 4;
    }
    if num_points >= 10 {
        return 3;
    }
    if num_points >= 2 {
        return 2;
    }
    1
}

/// Non-zero buckets per window, digit `d` lands in bucket `d - 1`.
pub(crate) const fn get_num_buckets(num_points: usize) -> usize {
    (1usize << get_optimal_bucket_width(num_points)) - 1
}

/// Windows needed to cover every bit of a canonical scalar.
pub(crate) const fn get_num_rounds(num_points: usize) -> usize {
    let bits_per_bucket = get_optimal_bucket_width(num_points);
    (SCALAR_BITS + bits_per_bucket - 1) / bits_per_bucket
}
