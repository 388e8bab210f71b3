//! Integration tests for descriptor rendering and parsing through the public API

use dial_xml::{
    parse_app_info, parse_device_descriptor, render_app_resource, render_device_descriptor,
    AppInfo, AppResource, AppState, DeviceDescriptor, Icon, XmlValue,
};

#[test]
fn test_device_descriptor_fields_survive_round_trip() {
    let device = DeviceDescriptor {
        uuid: "2fac1234-31f8-11b4-a222-08002b34c003".to_string(),
        friendly_name: "Kitchen Display".to_string(),
        manufacturer: "ACME".to_string(),
        model_name: "Screen 3000".to_string(),
        url_base: "http://10.0.0.7:8080".to_string(),
        icons: Vec::new(),
    };

    let tree = parse_device_descriptor(&render_device_descriptor(&device)).unwrap();
    let parsed = tree.path(&["root", "device"]).unwrap();

    assert_eq!(parsed.text_at(&["friendlyName"]), Some("Kitchen Display"));
    assert_eq!(parsed.text_at(&["manufacturer"]), Some("ACME"));
    assert_eq!(parsed.text_at(&["modelName"]), Some("Screen 3000"));
    assert_eq!(
        parsed.text_at(&["UDN"]),
        Some("uuid:2fac1234-31f8-11b4-a222-08002b34c003")
    );
    assert_eq!(
        parsed.text_at(&["serviceList", "service", "controlURL"]),
        Some("http://10.0.0.7:8080/ssdp/notfound")
    );
}

#[test]
fn test_many_icons_normalize_to_list() {
    let icon = |url: &str| Icon {
        mime_type: Some("image/png".to_string()),
        width: Some(120),
        height: Some(120),
        depth: Some(32),
        url: Some(url.to_string()),
    };
    let device = DeviceDescriptor {
        uuid: "u".to_string(),
        icons: vec![icon("/small.png"), icon("/large.png")],
        ..Default::default()
    };

    let tree = parse_device_descriptor(&render_device_descriptor(&device)).unwrap();
    let icons: Vec<Icon> = tree
        .path(&["root", "device", "iconList", "icon"])
        .map(XmlValue::items)
        .unwrap_or_default()
        .into_iter()
        .map(Icon::from_tree)
        .collect();

    assert_eq!(icons, device.icons);
}

#[test]
fn test_app_info_typed_view() {
    let app = AppResource {
        state: Some(AppState::Starting),
        pid: Some("instance-7".to_string()),
        allow_stop: false,
        additional_data: Some(vec![("token".to_string(), "abc".to_string())]),
        ..AppResource::new("Netflix")
    };
    let xml = render_app_resource(&app.description("Netflix"));
    let info = AppInfo::from_tree(&parse_app_info(&xml).unwrap()).unwrap();

    assert_eq!(info.name, "Netflix");
    assert_eq!(info.state, AppState::Starting);
    assert!(!info.allow_stop);
    assert_eq!(info.link_href.as_deref(), Some("instance-7"));
    assert_eq!(info.additional_data, vec![("token".to_string(), "abc".to_string())]);
}

#[test]
fn test_app_info_without_state_is_missing_element() {
    let tree = parse_app_info("<service><name>YouTube</name></service>").unwrap();
    assert!(AppInfo::from_tree(&tree).is_err());
}
