use super::{section_at, write_fmtp};
use crate::config::{CodecParamEdit, ParamValue};
use crate::report::Report;
use sdp_lines::{FmtpParams, SdpDocument};

/// Merge the configured format parameters into the fmtp lines of every matching payload type
pub fn edit_codec_params(doc: &mut SdpDocument, edit: &CodecParamEdit, report: &mut Report) {
    if edit.params.is_empty() {
        return;
    }

    let mut edited = 0;

    for index in 0..doc.sections().len() {
        let Some(section) = section_at(doc, index) else {
            break;
        };

        if section.kind != edit.kind {
            continue;
        }

        let payload_types: Vec<u8> = doc
            .rtpmaps(&section)
            .into_iter()
            .filter(|(_, rtpmap)| {
                rtpmap.is(&edit.codec)
                    && edit
                        .clock_rate
                        .is_none_or(|clock_rate| clock_rate == rtpmap.clock_rate)
            })
            .map(|(_, rtpmap)| rtpmap.payload)
            .collect();

        for pt in payload_types {
            // Lines move with every edit, look everything up again
            let Some(section) = section_at(doc, index) else {
                break;
            };

            let Some((rtpmap_line, _)) = doc.rtpmap_for(&section, pt) else {
                continue;
            };

            let existing = doc.fmtp_for(&section, pt).map(|(_, fmtp)| fmtp.params());
            let mut params = existing.clone().unwrap_or_default();

            merge(&mut params, &edit.params);

            if existing.as_ref() == Some(&params) || (existing.is_none() && params.is_empty()) {
                continue;
            }

            log::info!(
                "[{}] Setting {} parameters of payload type {pt} to {params:?}",
                report.peer(),
                edit.codec,
            );

            write_fmtp(doc, &section, pt, &params, rtpmap_line);
            edited += 1;
        }
    }

    if edited == 0 {
        log::debug!(
            "[{}] No {} payload type needed parameter changes",
            report.peer(),
            edit.codec
        );
    }
}

fn merge(params: &mut FmtpParams, edits: &[(String, ParamValue)]) {
    for (key, value) in edits {
        match value {
            ParamValue::Bool(false) => {
                params.remove(key);
            }
            ParamValue::Bool(true) => params.set(key, Some("1".into())),
            ParamValue::Integer(value) => params.set(key, Some(value.to_string())),
            ParamValue::Text(value) => params.set(key, Some(value.clone())),
        }
    }
}
