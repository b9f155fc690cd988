#![cfg(feature = "rayon")]

use cubepeak::{candidate_mask, max_filter, CubeView, Footprint, Neighborhood};

fn make_cube(shape: [usize; 3]) -> Vec<f32> {
    let mut data = Vec::with_capacity(shape[0] * shape[1] * shape[2]);
    for z in 0..shape[0] {
        for y in 0..shape[1] {
            for x in 0..shape[2] {
                let value = ((z * 7) ^ (y * 13) ^ (x * 5)) & 0xFF;
                data.push(value as f32 * 0.25);
            }
        }
    }
    // A spike and a few NaN cells so sanitation runs on both paths.
    data[shape[1] * shape[2] + 3] = 400.0;
    data[0] = f32::NAN;
    data[shape[2] + 1] = f32::NAN;
    data
}

fn sanitize_reference(data: &[f32]) -> Vec<f32> {
    let mut min = f32::INFINITY;
    for &v in data {
        if !v.is_nan() && v < min {
            min = v;
        }
    }
    data.iter()
        .map(|&v| if v.is_nan() { min } else { v })
        .collect()
}

fn naive_max_filter(data: &[f32], shape: [usize; 3], offsets: &[[isize; 3]]) -> Vec<f32> {
    let [nz, ny, nx] = shape;
    let clamp = |i: isize, extent: usize| i.clamp(0, extent as isize - 1) as usize;
    let mut out = Vec::with_capacity(data.len());
    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                let mut best = f32::NEG_INFINITY;
                for off in offsets {
                    let zz = clamp(z as isize + off[0], nz);
                    let yy = clamp(y as isize + off[1], ny);
                    let xx = clamp(x as isize + off[2], nx);
                    let value = data[(zz * ny + yy) * nx + xx];
                    if value > best {
                        best = value;
                    }
                }
                out.push(best);
            }
        }
    }
    out
}

fn box_offsets(half: isize) -> Vec<[isize; 3]> {
    let mut offsets = Vec::new();
    for z in -half..=half {
        for y in -half..=half {
            for x in -half..=half {
                offsets.push([z, y, x]);
            }
        }
    }
    offsets
}

#[test]
fn parallel_max_filter_matches_naive_reference() {
    let shape = [12, 10, 11];
    let data = make_cube(shape);
    let view = CubeView::from_slice(&data, shape).unwrap();

    let sanitized = sanitize_reference(&data);
    for size in [1usize, 3, 5] {
        let expected = naive_max_filter(&sanitized, shape, &box_offsets(size as isize / 2));
        let filtered = max_filter(view, &Neighborhood::Box { size }).unwrap();
        assert_eq!(filtered.data(), expected.as_slice());
    }
}

#[test]
fn parallel_candidate_mask_matches_naive_reference() {
    let shape = [9, 8, 7];
    let data = make_cube(shape);
    let view = CubeView::from_slice(&data, shape).unwrap();

    let sanitized = sanitize_reference(&data);
    let expected_max = naive_max_filter(&sanitized, shape, &box_offsets(1));
    let expected_mask: Vec<bool> = sanitized
        .iter()
        .zip(&expected_max)
        .map(|(&v, &m)| v == m)
        .collect();

    let mask = candidate_mask(view, &Neighborhood::Box { size: 3 }).unwrap();
    assert_eq!(mask.data(), expected_mask.as_slice());
}

#[test]
fn parallel_footprint_filter_matches_naive_reference() {
    let shape = [8, 9, 10];
    let data = make_cube(shape);
    let view = CubeView::from_slice(&data, shape).unwrap();

    // Axis-aligned cross: center plus one step along each axis direction.
    let mut selected = vec![false; 27];
    let offsets = [
        [0isize, 0, 0],
        [-1, 0, 0],
        [1, 0, 0],
        [0, -1, 0],
        [0, 1, 0],
        [0, 0, -1],
        [0, 0, 1],
    ];
    for off in offsets {
        let idx = ((off[0] + 1) * 3 + (off[1] + 1)) * 3 + (off[2] + 1);
        selected[idx as usize] = true;
    }
    let footprint = Footprint::from_vec(selected, [3, 3, 3]).unwrap();

    let sanitized = sanitize_reference(&data);
    let expected = naive_max_filter(&sanitized, shape, &offsets);
    let filtered = max_filter(view, &Neighborhood::Footprint(footprint)).unwrap();
    assert_eq!(filtered.data(), expected.as_slice());
}
