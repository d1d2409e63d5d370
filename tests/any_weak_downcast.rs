#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use nullref::{AnyWeak, Owned, Weak};

struct Button;
struct Slider;

#[test]
fn any_weak_downcast() {
    let _ = env_logger::Builder::from_env("NULLREF_LOG").try_init();

    let button = Owned::new(Button);
    let slider = Owned::new(Slider);
    let widgets: Vec<AnyWeak> = vec![AnyWeak::from(&button), AnyWeak::from(&slider)];

    assert!(widgets[0].is::<Button>());
    assert!(!widgets[0].is::<Slider>());

    let as_button: Weak<Button> = widgets[0].downcast();
    assert!(as_button == button);
    let mismatched: Weak<Slider> = widgets[0].downcast();
    assert!(mismatched.is_empty());

    drop(button);
    assert!(widgets[0].is_empty());
    assert!(as_button.is_empty());
    assert!(widgets[0].downcast::<Button>().is_empty());
    assert!(widgets[1].is_alive());

    drop(widgets);
    assert_eq!(Owned::weak_count(&slider), 0);
}
