use cfgmorph::{
    Frame, FrameIndex, MorphResult, Param, SceneConfig, ThetaSchedule, interpolate, morph,
};

fn fixture(name: &str) -> SceneConfig {
    let s = match name {
        "start" => include_str!("data/start.json"),
        "end" => include_str!("data/end.json"),
        "end_mismatched" => include_str!("data/end_mismatched.json"),
        other => panic!("unknown fixture {other}"),
    };
    serde_json::from_str(s).unwrap()
}

fn frames() -> Vec<Frame> {
    let start = fixture("start");
    let end = fixture("end");
    let thetas = ThetaSchedule::default().thetas();
    morph(&start, &end, &thetas)
        .unwrap()
        .collect::<MorphResult<_>>()
        .unwrap()
}

/// Every float the morph touches, keyed by a readable path.
fn floats(c: &SceneConfig) -> Vec<(String, f64)> {
    let mut out = Vec::new();
    for (i, t) in c.transforms.iter().enumerate() {
        for (k, v) in &t.params {
            let base = format!("{i}.{}.{k}", t.name);
            match v {
                Param::Scalar(f) => out.push((base, *f)),
                Param::Mapping(m) => {
                    for (ik, iv) in m {
                        if let Some(f) = iv.as_scalar() {
                            out.push((format!("{base}.{ik}"), f));
                        }
                    }
                }
                Param::Sequence(s) => {
                    for (j, iv) in s.iter().enumerate() {
                        if let Some(f) = iv.as_scalar() {
                            out.push((format!("{base}[{j}]"), f));
                        }
                    }
                }
                Param::Opaque(_) => {}
            }
        }
    }
    out
}

/// The config with every interpolated float and the image path blanked out.
fn without_floats(c: &SceneConfig) -> serde_json::Value {
    fn blank(v: &Param) -> Param {
        match v {
            Param::Scalar(_) => Param::Opaque(serde_json::Value::Null),
            other => other.clone(),
        }
    }

    fn strip(p: &Param) -> Param {
        match p {
            Param::Mapping(m) => {
                Param::Mapping(m.iter().map(|(k, v)| (k.clone(), blank(v))).collect())
            }
            Param::Sequence(s) => Param::Sequence(s.iter().map(blank).collect()),
            other => blank(other),
        }
    }

    let mut c = c.clone();
    c.image_settings.path.clear();
    for t in &mut c.transforms {
        for v in t.params.values_mut() {
            *v = strip(v);
        }
    }
    serde_json::to_value(&c).unwrap()
}

#[test]
fn fixtures_correspond() {
    fixture("start")
        .check_correspondence(&fixture("end"))
        .unwrap();
}

#[test]
fn reference_run_has_100_frames() {
    let frames = frames();
    assert_eq!(frames.len(), 100);
    assert_eq!(frames[0].theta, 1.0);
    assert_eq!(frames[99].theta, 0.8);
    for (i, f) in frames.iter().enumerate() {
        assert_eq!(f.index, FrameIndex(i as u64));
    }
}

#[test]
fn first_frame_equals_start() {
    let start = fixture("start");
    let first = &frames()[0];
    assert_eq!(floats(&first.config), floats(&start));
}

#[test]
fn last_frame_has_not_reached_end() {
    let start = floats(&fixture("start"));
    let end = floats(&fixture("end"));
    let last = floats(&frames()[99].config);

    assert_eq!(last.len(), end.len());
    let mut moved = 0;
    for ((s, e), l) in start.iter().zip(&end).zip(&last) {
        assert_eq!(s.0, l.0);
        if s.1 == e.1 {
            assert_eq!(l.1, e.1, "{} is equal at both ends", l.0);
        } else {
            moved += 1;
            assert_ne!(l.1, e.1, "{} reached the end value", l.0);
            assert!(((0.8 * s.1 + 0.2 * e.1) - l.1).abs() < 1e-12, "{}", l.0);
        }
    }
    assert!(moved > 20);
}

#[test]
fn non_float_fields_never_change() {
    let start = without_floats(&fixture("start"));
    for f in frames() {
        assert_eq!(without_floats(&f.config), start, "frame {}", f.index);
    }
}

#[test]
fn frames_do_not_feed_into_each_other() {
    let start = fixture("start");
    let end = fixture("end");
    let frames = frames();
    let f = &frames[50];
    let direct = interpolate(&start, &end, f.theta).unwrap();
    assert_eq!(floats(&f.config), floats(&direct));
}

#[test]
fn image_paths_follow_frame_index() {
    let frames = frames();
    assert_eq!(frames[0].config.image_settings.path, "morph_movie3/000.png");
    assert_eq!(frames[1].config.image_settings.path, "morph_movie3/001.png");
    assert_eq!(frames[99].config.image_settings.path, "morph_movie3/099.png");
}

#[test]
fn mismatched_end_is_rejected_before_any_frame() {
    let start = fixture("start");
    let end = fixture("end_mismatched");
    let err = morph(&start, &end, &[1.0]).err().unwrap();
    assert!(err.to_string().contains("mismatch"));
}
