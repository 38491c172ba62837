// [tests/mirror/libs/infra/provisioner/command_dispatch.test.rs]
/**
 * =================================================================
 * APARATO: COMMAND DISPATCH CERTIFIER (V5.0 - SUBPROCESS EVIDENCE)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-PROVISIONER
 * RESPONSABILIDAD: AUDITORÍA DEL PRODUCTOR NO CONFIABLE ACOTADO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. FINAL LINE PROTOCOL: Solo la última línea no vacía de stdout se
 *    decodifica; el resto es relay.
 * 2. DEADLINE GUARD: Un backend colgado muere en el timeout exacto.
 * 3. EXIT DISCRIMINATION: Código distinto de cero, payload ilegible y
 *    payload sin endpoint producen fallos tipados distintos.
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use enclagent_infra_provisioner::{CommandProvisioner, OutputChannel, ProvisionerError};
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    /// Cristaliza un script ejecutable de laboratorio y devuelve su ruta.
    fn forge_lab_script(scratch_dir: &tempfile::TempDir, name: &str, body: &str) -> String {
        let script_path = scratch_dir.path().join(name);
        let mut script_file = std::fs::File::create(&script_path).expect("script create");
        writeln!(script_file, "#!/bin/sh").expect("shebang");
        writeln!(script_file, "{}", body).expect("body");
        drop(script_file);

        let mut permissions = std::fs::metadata(&script_path).expect("metadata").permissions();
        permissions.set_mode(0o755);
        std::fs::set_permissions(&script_path, permissions).expect("chmod");

        script_path.to_string_lossy().into_owned()
    }

    /**
     * CERTIFICACIÓN: Despacho nominal con relay y línea final tipada.
     */
    #[tokio::test]
    async fn certify_nominal_dispatch_with_relay() {
        println!("\n🛠️ [PROVING_GROUNDS]: Auditing nominal subprocess dispatch...");

        let scratch_dir = tempfile::tempdir().expect("scratch dir");
        let script_path = forge_lab_script(
            &scratch_dir,
            "provision_ok.sh",
            concat!(
                "echo booting dedicated runtime\n",
                "echo warming caches\n",
                "echo '{\"instance_url\":\"https://i.example\",",
                "\"launched_on_eigencloud\":true,\"dedicated_instance\":true}'",
            ),
        );

        let provisioner = CommandProvisioner::new(script_path, 10_000);
        let (line_sender, mut line_receiver) = mpsc::channel(64);

        let outcome = provisioner
            .dispatch(&Uuid::new_v4(), line_sender)
            .await
            .expect("CRITICAL_FAULT: nominal dispatch collapsed.");

        assert_eq!(outcome.instance_url.as_deref(), Some("https://i.example"));
        assert!(outcome.launched_on_eigencloud);
        assert!(outcome.dedicated_instance);

        let mut relayed_lines = Vec::new();
        while let Ok(provision_line) = line_receiver.try_recv() {
            assert_eq!(provision_line.channel, OutputChannel::Stdout);
            relayed_lines.push(provision_line.content);
        }
        assert!(relayed_lines.iter().any(|line| line.contains("booting dedicated runtime")));

        println!("   ✅ Nominal dispatch and relay certified.");
    }

    /**
     * CERTIFICACIÓN: Código de salida distinto de cero es fallo tipado.
     */
    #[tokio::test]
    async fn certify_non_zero_exit_discrimination() {
        let scratch_dir = tempfile::tempdir().expect("scratch dir");
        let script_path = forge_lab_script(&scratch_dir, "provision_crash.sh", "echo collapsing\nexit 3");

        let provisioner = CommandProvisioner::new(script_path, 10_000);
        let (line_sender, _line_receiver) = mpsc::channel(64);

        let verdict = provisioner.dispatch(&Uuid::new_v4(), line_sender).await;
        assert!(matches!(verdict, Err(ProvisionerError::NonZeroExit { exit_code: 3 })));
        println!("   ✅ Non-zero exit discrimination certified.");
    }

    /**
     * CERTIFICACIÓN: Línea final ilegible -> resultado malformado.
     */
    #[tokio::test]
    async fn certify_malformed_payload_discrimination() {
        let scratch_dir = tempfile::tempdir().expect("scratch dir");
        let script_path =
            forge_lab_script(&scratch_dir, "provision_garbage.sh", "echo this is not json");

        let provisioner = CommandProvisioner::new(script_path, 10_000);
        let (line_sender, _line_receiver) = mpsc::channel(64);

        let verdict = provisioner.dispatch(&Uuid::new_v4(), line_sender).await;
        assert!(matches!(verdict, Err(ProvisionerError::MalformedResult(_))));
    }

    /**
     * CERTIFICACIÓN: Payload decodificable sin endpoint vivo -> rechazo.
     */
    #[tokio::test]
    async fn certify_hollow_payload_discrimination() {
        let scratch_dir = tempfile::tempdir().expect("scratch dir");
        let script_path = forge_lab_script(
            &scratch_dir,
            "provision_hollow.sh",
            "echo '{\"dedicated_instance\":true,\"launched_on_eigencloud\":false}'",
        );

        let provisioner = CommandProvisioner::new(script_path, 10_000);
        let (line_sender, _line_receiver) = mpsc::channel(64);

        let verdict = provisioner.dispatch(&Uuid::new_v4(), line_sender).await;
        assert!(matches!(verdict, Err(ProvisionerError::MalformedResult(_))));
    }

    /**
     * CERTIFICACIÓN: Un backend colgado muere en el deadline.
     */
    #[tokio::test]
    async fn certify_deadline_guard() {
        let scratch_dir = tempfile::tempdir().expect("scratch dir");
        let script_path = forge_lab_script(&scratch_dir, "provision_hang.sh", "sleep 30");

        let provisioner = CommandProvisioner::new(script_path, 400);
        let (line_sender, _line_receiver) = mpsc::channel(64);

        let verdict = provisioner.dispatch(&Uuid::new_v4(), line_sender).await;
        assert!(matches!(verdict, Err(ProvisionerError::Timeout { timeout_ms: 400 })));
        println!("   ✅ Deadline guard certified.");
    }
}
