use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use blemish::Result;
use blemish::geometry::{ImagePoint, ScreenPoint};
use blemish::io;
use blemish::ops::seamless::{PoissonCloner, RegionCloner};
use blemish::session::{ClickState, RetouchSession, SessionEvent, StatusLevel};
use blemish::settings::AppSettings;
use image::{Rgb, RgbImage};

type Calls = Rc<RefCell<Vec<(ImagePoint, ImagePoint, u32)>>>;

/// Delegates to the real Poisson cloner and remembers what it was asked.
struct Spy {
    calls: Calls,
    inner: PoissonCloner,
}

impl RegionCloner for Spy {
    fn clone_region(
        &self,
        image: &RgbImage,
        source: ImagePoint,
        target: ImagePoint,
        radius: u32,
    ) -> Result<RgbImage> {
        self.calls.borrow_mut().push((source, target, radius));
        self.inner.clone_region(image, source, target, radius)
    }
}

fn press(s: &mut RetouchSession, x: f32, y: f32) {
    s.handle(SessionEvent::PointerPressed(ScreenPoint::new(x, y)));
}

#[test]
fn large_photo_two_click_scenario() {
    let photo = RgbImage::from_fn(2000, 1500, |x, y| {
        Rgb([(x / 8 % 256) as u8, (y / 6 % 256) as u8, 120])
    });
    let calls: Calls = Rc::default();
    let mut session = RetouchSession::from_image(
        photo,
        PathBuf::from("scenario_fix.png"),
        &AppSettings::default(),
    )
    .with_cloner(Box::new(Spy {
        calls: Rc::clone(&calls),
        inner: PoissonCloner::default(),
    }));

    assert!((session.scale().value() - 0.6).abs() < 1e-9);
    assert_eq!(session.preview().dimensions(), (1200, 900));

    press(&mut session, 100.0, 100.0);
    assert_eq!(
        session.click_state(),
        ClickState::AwaitingSource {
            target: ImagePoint::new(167, 167)
        }
    );

    press(&mut session, 400.0, 100.0);
    assert_eq!(
        calls.borrow().as_slice(),
        &[(ImagePoint::new(667, 167), ImagePoint::new(167, 167), 20)]
    );
    assert_eq!(session.history_len(), 2);
    assert_eq!(session.click_state(), ClickState::AwaitingTarget);
    assert_eq!(session.image().dimensions(), (2000, 1500));
    assert_eq!(session.preview().dimensions(), (1200, 900));
}

#[test]
fn history_tracks_clones_and_undos() {
    let mut session = RetouchSession::from_image(
        RgbImage::from_pixel(300, 200, Rgb([90, 90, 90])),
        PathBuf::from("unused.png"),
        &AppSettings::default(),
    );

    for i in 0..3 {
        let before = session.history_len();
        press(&mut session, 50.0 + 20.0 * i as f32, 60.0);
        press(&mut session, 220.0, 120.0);
        assert_eq!(session.history_len(), before + 1);
    }

    for expected in [3, 2, 1, 1] {
        session.handle(SessionEvent::Undo);
        assert_eq!(session.history_len(), expected);
        assert_eq!(session.click_state(), ClickState::AwaitingTarget);
    }
}

#[test]
fn load_retouch_save_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("spotty.png");
    let output = dir.path().join("spotty_fix.png");

    let mut photo = RgbImage::from_pixel(160, 120, Rgb([180, 150, 130]));
    for y in 38..43 {
        for x in 38..43 {
            photo.put_pixel(x, y, Rgb([20, 10, 10]));
        }
    }
    io::save_image(&photo, &input).expect("write input");

    let mut session =
        RetouchSession::load(&input, output.clone(), &AppSettings::default()).expect("load");
    press(&mut session, 40.0, 40.0);
    press(&mut session, 110.0, 80.0);

    let reaction = session.handle(SessionEvent::Save);
    assert_eq!(reaction.status.map(|m| m.level), Some(StatusLevel::Info));

    let saved = io::load_image(&output).expect("reload");
    assert_eq!(saved.get_pixel(40, 40), &Rgb([180, 150, 130]));
    assert_eq!(saved.get_pixel(0, 0), photo.get_pixel(0, 0));
}

#[test]
fn unwritable_output_keeps_session_alive() {
    let dir = tempfile::tempdir().expect("tempdir");
    // A directory where the output file should go cannot be opened for writing.
    let output = dir.path().join("taken.png");
    std::fs::create_dir(&output).expect("mkdir");
    let mut session = RetouchSession::from_image(
        RgbImage::from_pixel(100, 100, Rgb([1, 2, 3])),
        output,
        &AppSettings::default(),
    );
    press(&mut session, 30.0, 30.0);
    press(&mut session, 70.0, 70.0);

    let reaction = session.handle(SessionEvent::Save);
    let status = reaction.status.expect("status");
    assert_eq!(status.level, StatusLevel::Warning);
    assert!(!reaction.exit);
    assert_eq!(session.history_len(), 2);

    // Still usable afterwards.
    session.handle(SessionEvent::Undo);
    assert_eq!(session.history_len(), 1);
}
