//! Behavioural properties of the individual stages.

use approx::assert_relative_eq;
use lstgis_algorithms::imagery::{
    cloud_mask, decode_qa_bits, emissivity, land_surface_temperature, median_composite, ndvi,
    vegetation_proportion, EmissivityParams, LstParams,
};
use lstgis_algorithms::statistics::{reduce_region, Reducer, ZonalParams};
use lstgis_algorithms::transect::{SampledSeries, TransectSample};
use lstgis_core::{GeoTransform, Raster, Region};

#[test]
fn decode_agrees_with_shift_and_mask_for_every_value() {
    for v in 0..=u16::MAX {
        assert_eq!(decode_qa_bits(v, 3, 4), (v >> 3) & 0b11);
        assert_eq!(decode_qa_bits(v, 10, 11), (v >> 10) & 0b11);
    }
}

#[test]
fn cloud_mask_on_two_by_two_qa() {
    let qa = Raster::from_vec(vec![0x0400u16, 0x0000, 0x0408, 0x0C00], 2, 2).unwrap();
    let mask = cloud_mask(&qa).unwrap();
    let values: Vec<u8> = mask.data().iter().copied().collect();
    assert_eq!(values, vec![1, 0, 0, 0]);
}

#[test]
fn ndvi_of_point_three_and_point_one() {
    let nir = Raster::filled(1, 1, 0.3);
    let red = Raster::filled(1, 1, 0.1);
    assert_relative_eq!(ndvi(&nir, &red).unwrap().get(0, 0).unwrap(), 0.5, epsilon = 1e-12);
}

#[test]
fn emissivity_stays_within_model_bounds() {
    let ndvi = Raster::from_vec(vec![-0.2, 0.0, 0.1, 0.35, 0.6], 1, 5).unwrap();
    let pv = vegetation_proportion(&ndvi, -0.2, 0.6).unwrap();
    let em = emissivity(&pv, EmissivityParams::default()).unwrap();
    for &e in em.data().iter() {
        assert!((0.986 - 1e-12..=0.990 + 1e-12).contains(&e), "EM {}", e);
    }
    assert_relative_eq!(em.get(0, 0).unwrap(), 0.986);
    assert_relative_eq!(em.get(0, 4).unwrap(), 0.990, epsilon = 1e-12);
}

#[test]
fn lst_reference_pixel() {
    let t = Raster::filled(1, 1, 300.0);
    let em = Raster::filled(1, 1, 0.986);
    let lst = land_surface_temperature(&t, &em, LstParams::default()).unwrap();

    let expected = 300.0 / (1.0 + (0.00115 * (300.0 / 0.48359547432)) * 0.986f64.ln()) - 273.15;
    assert_relative_eq!(lst.get(0, 0).unwrap(), expected, epsilon = 1e-9);
}

#[test]
fn median_ignores_masked_layers() {
    let a = Raster::from_vec(vec![f64::NAN, 1.0], 1, 2).unwrap();
    let b = Raster::from_vec(vec![f64::NAN, 5.0], 1, 2).unwrap();
    let c = Raster::from_vec(vec![f64::NAN, 2.0], 1, 2).unwrap();
    let out = median_composite(&[&a, &b, &c]).unwrap();
    assert!(out.get(0, 0).unwrap().is_nan());
    assert_eq!(out.get(0, 1).unwrap(), 2.0);
}

#[test]
fn all_nodata_region_reduces_to_none() {
    let mut r = Raster::filled(3, 3, f64::NAN);
    r.set_transform(GeoTransform::new(0.0, 3.0, 1.0, -1.0));
    let region = Region::from_rings(&[[0.0, 0.0], [3.0, 0.0], [3.0, 3.0], [0.0, 3.0]], &[]).unwrap();
    let params = ZonalParams {
        scale: 1.0,
        ..Default::default()
    };
    assert_eq!(reduce_region(&r, &region, Reducer::Min, &params).unwrap(), None);
    assert_eq!(reduce_region(&r, &region, Reducer::Max, &params).unwrap(), None);
}

#[test]
fn out_of_order_samples_come_back_sorted() {
    let samples = [250.0, 0.0, 100.0]
        .iter()
        .map(|&d| TransectSample {
            distance: d,
            values: vec![Some(d / 10.0)],
        })
        .collect();
    let series = SampledSeries::from_samples(&["temperature"], samples).unwrap();
    assert_eq!(series.distances, vec![0.0, 100.0, 250.0]);
    assert_eq!(
        series.band("temperature").unwrap(),
        &[Some(0.0), Some(10.0), Some(25.0)]
    );
}
