use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, HtmlCanvasElement, HtmlOptionElement, HtmlSelectElement, HtmlVideoElement,
};

use crate::error::ViewerError;
use crate::types::Device;

/// The viewer's markup, built inside the configured root element:
///
/// ```html
/// <p class="selected">selected: …</p>
/// <form><label>device <select></select></label></form>
/// <video class="input" autoplay playsinline muted></video>
/// <canvas id="output" class="output"></canvas>
/// ```
pub struct Layout {
    pub video: HtmlVideoElement,
    pub canvas: HtmlCanvasElement,
    pub selector: DeviceSelector,
    nodes: Vec<Element>,
}

impl Layout {
    pub fn mount(document: &Document, root_id: &str) -> Result<Self, ViewerError> {
        let root = document
            .get_element_by_id(root_id)
            .ok_or_else(|| ViewerError::MissingElement(root_id.to_string()))?;

        let status = create(document, "p")?;
        status.set_class_name("selected");

        let form = create(document, "form")?;
        let label = create(document, "label")?;
        label.set_text_content(Some("device "));
        let select: HtmlSelectElement = create_as(document, "select", "HtmlSelectElement")?;
        label
            .append_child(&select)
            .map_err(ViewerError::js("appendChild"))?;
        form.append_child(&label)
            .map_err(ViewerError::js("appendChild"))?;

        let video: HtmlVideoElement = create_as(document, "video", "HtmlVideoElement")?;
        video.set_class_name("input");
        video.set_autoplay(true);
        video.set_muted(true);
        video
            .set_attribute("playsinline", "")
            .map_err(ViewerError::js("setAttribute"))?;

        let canvas: HtmlCanvasElement = create_as(document, "canvas", "HtmlCanvasElement")?;
        canvas.set_id("output");
        canvas.set_class_name("output");

        let nodes: Vec<Element> = vec![
            status.clone(),
            form,
            video.clone().into(),
            canvas.clone().into(),
        ];
        for node in &nodes {
            root.append_child(node)
                .map_err(ViewerError::js("appendChild"))?;
        }

        let selector = DeviceSelector { select, status };
        selector.show_selection("");

        Ok(Self {
            video,
            canvas,
            selector,
            nodes,
        })
    }

    pub fn unmount(&self) {
        for node in &self.nodes {
            node.remove();
        }
    }
}

/// The camera `<select>` and the "selected: …" line above it.
#[derive(Clone)]
pub struct DeviceSelector {
    select: HtmlSelectElement,
    status: Element,
}

impl DeviceSelector {
    pub fn element(&self) -> &HtmlSelectElement {
        &self.select
    }

    pub fn value(&self) -> String {
        self.select.value()
    }

    pub fn render_devices(&self, devices: &[Device], selected: &str) -> Result<(), ViewerError> {
        self.select.set_length(0);
        for (index, device) in devices.iter().enumerate() {
            let option =
                HtmlOptionElement::new_with_text_and_value(&option_label(device, index), &device.device_id)
                    .map_err(ViewerError::js("new Option"))?;
            self.select
                .add_with_html_option_element(&option)
                .map_err(ViewerError::js("HTMLSelectElement.add"))?;
        }
        self.show_selection(selected);
        Ok(())
    }

    /// A value without a matching option leaves the control blank.
    pub fn show_selection(&self, device_id: &str) {
        self.select.set_value(device_id);
        self.status
            .set_text_content(Some(&format!("selected: {}", device_id)));
    }
}

/// Browsers blank out labels until camera access is granted.
pub fn option_label(device: &Device, index: usize) -> String {
    if device.label.is_empty() {
        format!("Camera {}", index + 1)
    } else {
        device.label.clone()
    }
}

fn create(document: &Document, tag: &str) -> Result<Element, ViewerError> {
    document
        .create_element(tag)
        .map_err(ViewerError::js("createElement"))
}

fn create_as<T: JsCast>(
    document: &Document,
    tag: &str,
    expected: &'static str,
) -> Result<T, ViewerError> {
    create(document, tag)?
        .dyn_into::<T>()
        .map_err(|_| ViewerError::UnexpectedType(expected))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_labels_fall_back_to_position() {
        assert_eq!(option_label(&Device::video("", ""), 0), "Camera 1");
        assert_eq!(option_label(&Device::video("cam-2", ""), 1), "Camera 2");
        assert_eq!(
            option_label(&Device::video("cam-1", "FaceTime HD"), 0),
            "FaceTime HD"
        );
    }
}
